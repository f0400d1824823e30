use anyhow::Result;
use ratatui::backend::Backend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::line::NORMAL as LINE;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph};
use ratatui::{Frame, Terminal};
// Use Popup from tui-widgets to render the detail modal
use tui_widgets::popup::Popup;

use crate::config::{RgbColor, SearchMode};
use crate::print;

use super::app::{App, Focus};

const SEARCH_HELP_REACTIVE: &str = "Type to filter  Enter/Esc: results  F2: all  F9: print  F1: help";
const SEARCH_HELP_MANUAL: &str = "Type a name  Enter: search  F2: all  F9: print  F1: help";
const RESULTS_HELP: &str = "j/k: nav  Enter: details  /: search  a: all  p: print  ?: help  q: quit";
const DETAIL_HELP: &str = "Esc/q/Enter: close  click outside: close";
const HELP_MODAL_FOOTER: &str = "j/k: scroll  Esc/q: close";

pub fn render<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    terminal.draw(|frame| draw_frame(frame, app))?;
    Ok(())
}

fn draw_frame(frame: &mut Frame<'_>, app: &mut App) {
    let size = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(size);

    draw_header(frame, layout[0], app);
    draw_search(frame, layout[1], app);
    draw_results(frame, layout[2], app);
    draw_footer(frame, layout[3], app);
    draw_detail_modal(frame, size, app);
    draw_help_modal(frame, size, app);
    draw_banner_modal(frame, size, app);
}

fn draw_header(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let header_style = header_text_style(app);
    let directory = &app.directory;

    let mode = match directory.mode() {
        SearchMode::Reactive => "REACTIVE",
        SearchMode::Manual => "MANUAL",
    };
    let counts = format!(
        "{}/{} | {} ",
        directory.result_count(),
        directory.store().len(),
        mode
    );

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(counts.len() as u16)])
        .split(area);

    let mut spans = vec![Span::styled("MATDAR://", header_style)];
    match directory.store().origin() {
        Some(origin) => spans.push(Span::styled(origin.to_string(), header_style)),
        None => spans.push(Span::styled("no voter list", header_style)),
    }
    if app.load_error.is_some() {
        spans.push(Span::raw("   "));
        spans.push(Span::styled(
            "LOAD FAILED",
            header_style.add_modifier(Modifier::BOLD),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), chunks[0]);
    frame.render_widget(
        Paragraph::new(counts)
            .style(header_style)
            .alignment(Alignment::Right),
        chunks[1],
    );
}

fn draw_search(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let active = app.focus == Focus::Input && !modal_open(app);
    let title = match app.directory.mode() {
        SearchMode::Reactive => " SEARCH ",
        SearchMode::Manual => " SEARCH [Enter to run] ",
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app, active))
        .title(Span::styled(title, header_text_style(app)));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let value_style = if active {
        selection_style(app)
    } else {
        Style::default()
    };
    let line = Line::from(Span::styled(
        app.search_input.value().to_string(),
        value_style,
    ));
    frame.render_widget(Paragraph::new(line), inner);

    if active {
        let x = inner
            .x
            .saturating_add(app.search_input.visual_cursor() as u16);
        frame.set_cursor_position((x, inner.y));
    }
}

fn draw_results(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    let active = app.focus == Focus::Results && !modal_open(app);
    let title = if app.directory.showing_all() {
        " ALL VOTERS "
    } else {
        " RESULTS "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app, active))
        .title(Span::styled(title, header_text_style(app)));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    app.list_area = inner;

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    if !app.directory.has_results() {
        let message = empty_message(app);
        render_centered_line(frame, inner, message, header_text_style(app));
        return;
    }

    let labels = app.directory.labels();
    let title_style = Style::default().add_modifier(Modifier::BOLD);
    let subtitle_style = header_text_style(app);
    let items: Vec<ListItem> = app
        .directory
        .results()
        .into_iter()
        .map(|record| {
            let card = print::compact_card(record, labels);
            ListItem::new(vec![
                Line::from(Span::styled(format!(" {}", card.title), title_style)),
                Line::from(Span::styled(format!(" {}", card.subtitle), subtitle_style)),
                Line::from(""),
            ])
        })
        .collect();

    let highlight = if active {
        selection_style(app)
    } else {
        Style::default().add_modifier(Modifier::REVERSED)
    };
    let list = List::new(items).highlight_style(highlight);

    frame.render_stateful_widget(list, inner, &mut app.list_state);
}

fn empty_message(app: &App) -> &'static str {
    let directory = &app.directory;
    if directory.store().is_empty() {
        if app.load_error.is_some() {
            "Voter list could not be loaded. F5 to retry."
        } else {
            "The voter list is empty."
        }
    } else if directory.query().trim().is_empty() && !directory.showing_all() {
        match directory.mode() {
            SearchMode::Reactive => "Type to search.",
            SearchMode::Manual => "Type a name and press Enter.",
        }
    } else {
        "No results."
    }
}

fn draw_detail_modal(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    let Some(record) = app.directory.selected() else {
        return;
    };
    let labels = app.directory.labels();
    let fields = print::detail_fields(record, labels);
    let title = if record.full_name.is_empty() {
        labels.name().to_string()
    } else {
        record.full_name.clone()
    };

    let label_width = fields
        .iter()
        .map(|field| field.label.chars().count() + 1)
        .max()
        .unwrap_or(0);
    let label_style = header_text_style(app);
    let mut lines: Vec<Line> = fields
        .into_iter()
        .map(|field| {
            let label = format!("{:width$} ", format!("{}:", field.label), width = label_width);
            Line::from(vec![
                Span::styled(label, label_style),
                Span::raw(field.value),
            ])
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(DETAIL_HELP, label_style)));

    let title_line = Line::from(Span::styled(format!(" {} ", title), label_style));
    let popup = Popup::new(Text::from(lines))
        .title(title_line)
        .border_style(border_style(app, true));

    // Render popup using state so clicks can be tested against its area
    frame.render_stateful_widget_ref(popup, area, &mut app.modal_popup);
}

fn draw_help_modal(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    if app.help_modal.is_none() {
        return;
    }

    // Calculate modal size: 2/3 width, 80% height
    let width = area.width.saturating_mul(2).saturating_div(3).max(40).min(area.width);
    let height = area.height.saturating_mul(4).saturating_div(5).max(10).min(area.height);

    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let modal_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, modal_area);

    let header_style = header_text_style(app);
    let border_s = border_style(app, true);

    let sections = app.help_entries();
    let mut lines: Vec<Line> = Vec::new();

    let content_width = width.saturating_sub(4) as usize;
    let action_width = 20usize;

    for (section_idx, section) in sections.iter().enumerate() {
        let header_text = format!(" {} ", section.title);
        let padding_total = content_width.saturating_sub(header_text.len());
        let left_pad = padding_total / 2;
        let right_pad = padding_total - left_pad;
        let header_line = format!(
            "{}{}{}",
            LINE.horizontal.to_string().repeat(left_pad),
            header_text,
            LINE.horizontal.to_string().repeat(right_pad)
        );
        lines.push(Line::from(Span::styled(header_line, header_style)));

        for entry in &section.entries {
            let action = format!("{:<width$}", entry.action, width = action_width);
            lines.push(Line::from(vec![
                Span::styled(action, Style::default()),
                Span::styled(entry.keys.clone(), header_style),
            ]));
        }

        if section_idx < sections.len() - 1 {
            lines.push(Line::from(""));
        }
    }

    let total_lines = lines.len();
    // borders (2) + footer line (1)
    let inner_height = height.saturating_sub(3) as usize;

    let Some(modal) = app.help_modal.as_mut() else {
        return;
    };
    modal.total_lines = total_lines;
    modal.viewport_height = inner_height;

    let max_scroll = modal.total_lines.saturating_sub(modal.viewport_height);
    if modal.scroll > max_scroll {
        modal.scroll = max_scroll;
    }

    let scroll_indicator = match (modal.can_scroll_up(), modal.can_scroll_down()) {
        (true, true) => "▲▼",
        (true, false) => "▲ ",
        (false, true) => " ▼",
        (false, false) => "  ",
    };

    let visible_lines: Vec<Line> = lines
        .into_iter()
        .skip(modal.scroll)
        .take(modal.viewport_height)
        .collect();

    let title = Line::from(vec![
        Span::styled(" HELP ", header_style),
        Span::styled(scroll_indicator, header_style),
    ]);
    let footer = Line::from(Span::styled(
        format!(" {} ", HELP_MODAL_FOOTER),
        header_style,
    ));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_s)
        .title(title)
        .title_bottom(footer)
        .title_alignment(Alignment::Center);

    let inner = block.inner(modal_area);
    frame.render_widget(block, modal_area);
    frame.render_widget(Paragraph::new(visible_lines), inner);
}

/// Small blocking banner for reloads and queued print jobs.
fn draw_banner_modal(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let message = if let Some(modal) = &app.loading_modal {
        modal.message.clone()
    } else if let Some(job) = &app.print_job {
        format!("PRINTING {} RECORD(S)...", job.document.len())
    } else {
        return;
    };

    let width = (message.chars().count() as u16 + 4).max(30).min(area.width);
    let height = 3u16.min(area.height);

    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let modal_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, modal_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app, true));

    let inner = block.inner(modal_area);
    frame.render_widget(block, modal_area);

    let text = Paragraph::new(message)
        .alignment(Alignment::Center)
        .style(header_text_style(app));
    frame.render_widget(text, inner);
}

fn draw_footer(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let message: String = if app.help_modal.is_some() {
        HELP_MODAL_FOOTER.to_string()
    } else if app.directory.has_selection() {
        DETAIL_HELP.to_string()
    } else if let Some(status) = &app.status {
        status.clone()
    } else {
        match (app.focus, app.directory.mode()) {
            (Focus::Input, SearchMode::Reactive) => SEARCH_HELP_REACTIVE.to_string(),
            (Focus::Input, SearchMode::Manual) => SEARCH_HELP_MANUAL.to_string(),
            (Focus::Results, _) => RESULTS_HELP.to_string(),
        }
    };
    let colors = app.ui_colors();
    let style = Style::default()
        .fg(color(colors.status_fg))
        .bg(color(colors.status_bg));

    let background = Block::default().style(Style::default().bg(color(colors.status_bg)));
    frame.render_widget(background, area);

    frame.render_widget(Paragraph::new(message).style(style), area);
}

fn modal_open(app: &App) -> bool {
    app.directory.has_selection()
        || app.help_modal.is_some()
        || app.loading_modal.is_some()
        || app.print_job.is_some()
}

fn render_centered_line(frame: &mut Frame<'_>, area: Rect, text: &str, style: Style) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let target = Rect {
        x: area.x,
        y: area.y + area.height.saturating_sub(1) / 2,
        width: area.width,
        height: 1,
    };
    frame.render_widget(
        Paragraph::new(text).style(style).alignment(Alignment::Center),
        target,
    );
}

fn selection_style(app: &App) -> Style {
    let colors = app.ui_colors();
    Style::default()
        .fg(color(colors.selection_fg))
        .bg(color(colors.selection_bg))
}

fn border_style(app: &App, active: bool) -> Style {
    let colors = app.ui_colors();
    let style = Style::default().fg(color(colors.border));
    if active {
        style.add_modifier(Modifier::BOLD)
    } else {
        style
    }
}

fn header_text_style(app: &App) -> Style {
    let colors = app.ui_colors();
    Style::default().fg(color(colors.separator))
}

fn color(rgb: RgbColor) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}
