use std::io::stdout;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Position, Rect};
use ratatui::widgets::ListState;
use ratatui::Terminal;
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;
use tui_widgets::popup::PopupState;

use crate::config::{self, Config, SearchMode, UiColors};
use crate::directory::Directory;
use crate::print::{self, PrintDocument};
use crate::store;

use super::draw;

/// Rows taken by one result card: title, subtitle, spacer.
pub const CARD_HEIGHT: u16 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Results,
}

/// Help modal state with scroll support
#[derive(Debug, Clone)]
pub struct HelpModal {
    /// Current scroll offset (line index at top of viewport)
    pub scroll: usize,
    /// Total number of content lines
    pub total_lines: usize,
    /// Viewport height (set during rendering)
    pub viewport_height: usize,
}

impl HelpModal {
    pub fn new(total_lines: usize) -> Self {
        Self {
            scroll: 0,
            total_lines,
            viewport_height: 10,
        }
    }

    pub fn scroll_down(&mut self, lines: usize) {
        let max_scroll = self.total_lines.saturating_sub(self.viewport_height);
        self.scroll = (self.scroll + lines).min(max_scroll);
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn can_scroll_up(&self) -> bool {
        self.scroll > 0
    }

    pub fn can_scroll_down(&self) -> bool {
        self.scroll + self.viewport_height < self.total_lines
    }
}

/// A section in the help modal (e.g., "Global", "Results")
pub struct HelpSection {
    pub title: &'static str,
    pub entries: Vec<HelpEntry>,
}

/// A single help entry (action name + key bindings)
pub struct HelpEntry {
    pub action: &'static str,
    pub keys: String,
}

/// Blocking modal shown while the voter list is reloaded.
#[derive(Debug, Clone)]
pub struct LoadingModal {
    pub message: String,
}

/// A print request waiting for the frame that announces it to be drawn.
#[derive(Debug, Clone)]
pub struct PrintJob {
    pub document: PrintDocument,
}

pub struct App<'a> {
    config: &'a Config,
    pub directory: Directory,
    pub search_input: Input,
    pub focus: Focus,
    /// Highlighted result position.
    pub cursor: usize,
    pub list_state: ListState,
    /// Where the result list was last drawn, for mouse hit testing.
    pub list_area: Rect,
    pub status: Option<String>,
    pub load_error: Option<String>,
    // Popup state for the detail modal (tui-widgets popup)
    pub modal_popup: PopupState,
    pub help_modal: Option<HelpModal>,
    pub loading_modal: Option<LoadingModal>,
    pub print_job: Option<PrintJob>,
    // Flag to trigger a reload from the event loop
    pub pending_reload: bool,
    data_dir: PathBuf,
}

impl<'a> App<'a> {
    pub fn new(config: &'a Config, directory: Directory, load_error: Option<String>) -> Self {
        let data_dir = config::data_dir().unwrap_or_else(|_| PathBuf::from("."));
        let status = load_error
            .as_ref()
            .map(|err| format!("Could not load voter list: {}", err));
        Self {
            config,
            directory,
            search_input: Input::default(),
            focus: Focus::Input,
            cursor: 0,
            list_state: ListState::default(),
            list_area: Rect::default(),
            status,
            load_error,
            modal_popup: PopupState::default(),
            help_modal: None,
            loading_modal: None,
            print_job: None,
            pending_reload: false,
            data_dir,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        stdout.execute(EnterAlternateScreen)?;
        stdout.execute(EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(DisableMouseCapture)?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop<B>(&mut self, terminal: &mut Terminal<B>) -> Result<()>
    where
        B: ratatui::backend::Backend,
    {
        loop {
            draw::render(terminal, self)?;
            if self.frame_settled() {
                continue;
            }

            // Handle pending reload (shows blocking modal)
            if self.pending_reload {
                self.pending_reload = false;
                self.loading_modal = Some(LoadingModal {
                    message: "LOADING...".to_string(),
                });
                draw::render(terminal, self)?;
                self.reload();
                self.loading_modal = None;
                continue;
            }

            if event::poll(Duration::from_millis(250))? {
                match event::read()? {
                    Event::Key(key) => {
                        if self.handle_key(key)? {
                            break;
                        }
                    }
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    Event::Resize(_, _) => {}
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Called once a frame has been fully drawn. A queued print job is only
    /// handed to the printer here, after the frame announcing it is on
    /// screen. Returns true when a job was dispatched.
    pub fn frame_settled(&mut self) -> bool {
        let Some(job) = self.print_job.take() else {
            return false;
        };
        let sink = print::sink_for(&self.config.print, &self.data_dir);
        match sink.print(&job.document) {
            Ok(()) => {
                tracing::info!(records = job.document.len(), destination = %sink.describe(), "printed results");
                self.set_status(format!(
                    "Printed {} record(s) to {}",
                    job.document.len(),
                    sink.describe()
                ));
            }
            Err(err) => {
                tracing::error!(error = %format!("{err:#}"), "print failed");
                self.set_status(format!("Print failed: {:#}", err));
            }
        }
        true
    }

    pub fn request_print(&mut self) {
        match self.directory.print_document() {
            Some(document) => {
                self.print_job = Some(PrintJob { document });
            }
            None => self.set_status("Nothing to print"),
        }
    }

    fn reload(&mut self) {
        match store::load(&self.config.source) {
            Ok(store) => {
                let count = store.len();
                self.directory.replace_store(store);
                self.load_error = None;
                self.clamp_cursor();
                self.set_status(format!("Loaded {} record(s)", count));
            }
            Err(err) => {
                let message = format!("{:#}", anyhow::Error::new(err));
                tracing::error!(error = %message, "reload failed");
                self.set_status(format!("Reload failed: {}", message));
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        // Ctrl+C always quits (hardcoded for safety)
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            return Ok(true);
        }

        self.status = None;

        if self.loading_modal.is_some() || self.print_job.is_some() {
            return Ok(false);
        }

        if self.help_modal.is_some() {
            self.handle_help_modal_key(key);
            return Ok(false);
        }

        if self.directory.has_selection() {
            self.handle_detail_modal_key(key);
            return Ok(false);
        }

        match self.focus {
            Focus::Input => {
                self.handle_input_key(key);
                Ok(false)
            }
            Focus::Results => Ok(self.handle_results_key(key)),
        }
    }

    fn handle_detail_modal_key(&mut self, key: KeyEvent) {
        let config = self.config;
        if self.key_matches_any(&key, &config.keys.modal.close) {
            self.close_detail();
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        let config = self.config;
        let input_keys = &config.keys.search_input;

        // Cancel: move focus to results
        if self.key_matches_any(&key, &input_keys.cancel) {
            self.focus = Focus::Results;
            return;
        }

        // Confirm: run the search in manual mode, then move to the results
        if self.key_matches_any(&key, &input_keys.confirm) {
            if self.directory.mode() == SearchMode::Manual {
                self.directory.search();
                self.reset_cursor();
            }
            if self.directory.has_results() {
                self.focus = Focus::Results;
            } else {
                self.set_status("No results");
            }
            return;
        }

        if self.key_matches_any(&key, &input_keys.next) {
            self.move_cursor(1);
            return;
        }
        if self.key_matches_any(&key, &input_keys.prev) {
            self.move_cursor(-1);
            return;
        }

        // Function-key globals still work while typing; printable ones are text
        if !matches!(key.code, KeyCode::Char(_)) && self.handle_global_key(&key) {
            return;
        }

        if let Some(change) = self.search_input.handle_event(&Event::Key(key)) {
            if change.value {
                self.directory.set_query(self.search_input.value());
                if self.directory.mode() == SearchMode::Reactive {
                    self.reset_cursor();
                }
            }
        }
    }

    /// Returns true when the app should quit.
    fn handle_results_key(&mut self, key: KeyEvent) -> bool {
        if self.key_matches_any(&key, &self.config.keys.global.quit) {
            return true;
        }

        if self.handle_global_key(&key) {
            return false;
        }

        let config = self.config;
        let results_keys = &config.keys.results;

        if self.key_matches_any(&key, &results_keys.search) {
            self.focus = Focus::Input;
        } else if self.key_matches_any(&key, &results_keys.confirm) {
            self.open_detail(self.cursor);
        } else if self.key_matches_any(&key, &results_keys.next) {
            self.move_cursor(1);
        } else if self.key_matches_any(&key, &results_keys.prev) {
            self.move_cursor(-1);
        } else if self.key_matches_any(&key, &results_keys.page_down) {
            self.move_cursor(self.page_size());
        } else if self.key_matches_any(&key, &results_keys.page_up) {
            self.move_cursor(-self.page_size());
        }
        false
    }

    /// Help, print, show all and reload. Returns true if the key was used.
    fn handle_global_key(&mut self, key: &KeyEvent) -> bool {
        let config = self.config;
        let global = &config.keys.global;
        if self.key_matches_any(key, &global.help) {
            self.show_help();
        } else if self.key_matches_any(key, &global.print) {
            self.request_print();
        } else if self.key_matches_any(key, &global.show_all) {
            self.directory.show_all();
            self.reset_cursor();
            self.set_status(format!("Showing all {} record(s)", self.directory.result_count()));
        } else if self.key_matches_any(key, &global.reload) {
            self.pending_reload = true;
        } else {
            return false;
        }
        true
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.loading_modal.is_some() || self.help_modal.is_some() {
            return;
        }
        let position = Position::new(mouse.column, mouse.row);

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if self.directory.has_selection() {
                    // Clicking the backdrop closes the detail modal
                    let inside = self
                        .modal_popup
                        .area()
                        .map(|area| area.contains(position))
                        .unwrap_or(false);
                    if !inside {
                        self.close_detail();
                    }
                    return;
                }
                if let Some(position) = self.result_at(position) {
                    self.cursor = position;
                    self.list_state.select(Some(position));
                    self.focus = Focus::Results;
                    self.open_detail(position);
                }
            }
            MouseEventKind::ScrollDown if !self.directory.has_selection() => self.move_cursor(1),
            MouseEventKind::ScrollUp if !self.directory.has_selection() => self.move_cursor(-1),
            _ => {}
        }
    }

    /// Result position under a screen cell, using the last drawn list.
    fn result_at(&self, position: Position) -> Option<usize> {
        if !self.list_area.contains(position) {
            return None;
        }
        let row = position.y - self.list_area.y;
        let index = self.list_state.offset() + (row / CARD_HEIGHT) as usize;
        (index < self.directory.result_count()).then_some(index)
    }

    fn open_detail(&mut self, position: usize) {
        if self.directory.select_result(position) {
            self.modal_popup = PopupState::default();
        }
    }

    fn close_detail(&mut self) {
        self.directory.clear_selection();
    }

    fn page_size(&self) -> isize {
        ((self.list_area.height / CARD_HEIGHT).max(1)) as isize
    }

    fn move_cursor(&mut self, delta: isize) {
        let count = self.directory.result_count();
        if count == 0 {
            self.cursor = 0;
            self.list_state.select(None);
            return;
        }
        let next = (self.cursor as isize + delta).clamp(0, count as isize - 1);
        self.cursor = next as usize;
        self.list_state.select(Some(self.cursor));
    }

    fn reset_cursor(&mut self) {
        self.cursor = 0;
        self.list_state = ListState::default();
        if self.directory.has_results() {
            self.list_state.select(Some(0));
        }
    }

    fn clamp_cursor(&mut self) {
        self.move_cursor(0);
    }

    fn set_status<S: Into<String>>(&mut self, message: S) {
        self.status = Some(message.into());
    }

    pub fn ui_colors(&self) -> &UiColors {
        &self.config.ui.colors
    }

    /// Check if the key event matches any of the bindings in the list
    fn key_matches_any(&self, event: &KeyEvent, bindings: &[String]) -> bool {
        bindings.iter().any(|b| key_matches_single(event, b))
    }

    // =========================================================================
    // Help Modal
    // =========================================================================

    /// Generate help content from current keybindings configuration
    pub fn help_entries(&self) -> Vec<HelpSection> {
        let keys = &self.config.keys;
        let confirm_action = match self.directory.mode() {
            SearchMode::Manual => "Run search",
            SearchMode::Reactive => "Go to results",
        };

        vec![
            HelpSection {
                title: "Global",
                entries: vec![
                    HelpEntry {
                        action: "Quit",
                        keys: keys.global.quit.join(", "),
                    },
                    HelpEntry {
                        action: "Help",
                        keys: keys.global.help.join(", "),
                    },
                    HelpEntry {
                        action: "Print results",
                        keys: keys.global.print.join(", "),
                    },
                    HelpEntry {
                        action: "Show all",
                        keys: keys.global.show_all.join(", "),
                    },
                    HelpEntry {
                        action: "Reload list",
                        keys: keys.global.reload.join(", "),
                    },
                ],
            },
            HelpSection {
                title: "Search Input",
                entries: vec![
                    HelpEntry {
                        action: confirm_action,
                        keys: keys.search_input.confirm.join(", "),
                    },
                    HelpEntry {
                        action: "Focus results",
                        keys: keys.search_input.cancel.join(", "),
                    },
                    HelpEntry {
                        action: "Next result",
                        keys: keys.search_input.next.join(", "),
                    },
                    HelpEntry {
                        action: "Previous result",
                        keys: keys.search_input.prev.join(", "),
                    },
                ],
            },
            HelpSection {
                title: "Results",
                entries: vec![
                    HelpEntry {
                        action: "Open details",
                        keys: keys.results.confirm.join(", "),
                    },
                    HelpEntry {
                        action: "Focus search",
                        keys: keys.results.search.join(", "),
                    },
                    HelpEntry {
                        action: "Next",
                        keys: keys.results.next.join(", "),
                    },
                    HelpEntry {
                        action: "Previous",
                        keys: keys.results.prev.join(", "),
                    },
                    HelpEntry {
                        action: "Page down",
                        keys: keys.results.page_down.join(", "),
                    },
                    HelpEntry {
                        action: "Page up",
                        keys: keys.results.page_up.join(", "),
                    },
                ],
            },
            HelpSection {
                title: "Details",
                entries: vec![
                    HelpEntry {
                        action: "Close",
                        keys: keys.modal.close.join(", "),
                    },
                    HelpEntry {
                        action: "Close (mouse)",
                        keys: "click outside".to_string(),
                    },
                ],
            },
        ]
    }

    fn help_total_lines(&self) -> usize {
        let sections = self.help_entries();
        let entries: usize = sections.iter().map(|s| s.entries.len() + 1).sum();
        entries + sections.len().saturating_sub(1)
    }

    pub fn show_help(&mut self) {
        let total_lines = self.help_total_lines();
        self.help_modal = Some(HelpModal::new(total_lines));
    }

    fn handle_help_modal_key(&mut self, key: KeyEvent) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('q'))
            || self.key_matches_any(&key, &self.config.keys.global.help)
        {
            self.help_modal = None;
            return;
        }

        let Some(modal) = self.help_modal.as_mut() else {
            return;
        };

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => modal.scroll_down(1),
            KeyCode::Char('k') | KeyCode::Up => modal.scroll_up(1),
            KeyCode::PageDown => {
                let page = modal.viewport_height.saturating_sub(1).max(1);
                modal.scroll_down(page);
            }
            KeyCode::PageUp => {
                let page = modal.viewport_height.saturating_sub(1).max(1);
                modal.scroll_up(page);
            }
            _ => {}
        }
    }
}

/// Check if the key event matches a single binding string
fn key_matches_single(event: &KeyEvent, binding: &str) -> bool {
    let trimmed = binding.trim();
    if trimmed.is_empty() {
        return false;
    }

    // Disallow Ctrl/Alt/Super modifiers (we don't support them)
    let disallowed = KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER;
    if event.modifiers.intersects(disallowed) {
        return false;
    }

    let lower = trimmed.to_ascii_lowercase();
    if let Some(number) = lower
        .strip_prefix('f')
        .and_then(|rest| rest.parse::<u8>().ok())
        .filter(|n| (1..=12).contains(n))
    {
        return matches!(event.code, KeyCode::F(n) if n == number);
    }

    match lower.as_str() {
        "enter" => matches!(event.code, KeyCode::Enter),
        "tab" => matches!(event.code, KeyCode::Tab),
        "backtab" | "shift+tab" => matches!(event.code, KeyCode::BackTab),
        "backspace" => matches!(event.code, KeyCode::Backspace),
        "esc" | "escape" => matches!(event.code, KeyCode::Esc),
        "space" => matches!(event.code, KeyCode::Char(' ')),
        "up" => matches!(event.code, KeyCode::Up),
        "down" => matches!(event.code, KeyCode::Down),
        "left" => matches!(event.code, KeyCode::Left),
        "right" => matches!(event.code, KeyCode::Right),
        "pageup" | "page_up" => matches!(event.code, KeyCode::PageUp),
        "pagedown" | "page_down" => matches!(event.code, KeyCode::PageDown),
        "home" => matches!(event.code, KeyCode::Home),
        "end" => matches!(event.code, KeyCode::End),
        // Single character - case-sensitive (a != A, since A requires Shift)
        _ => {
            let mut chars = trimmed.chars();
            if let (Some(first), None) = (chars.next(), chars.next()) {
                matches!(event.code, KeyCode::Char(c) if c == first)
            } else {
                false
            }
        }
    }
}
