//! Search state shared by the terminal UI and the command line.
//!
//! [`Directory`] owns the record store, the query, the current result list
//! and the selection. Front ends only feed it events (query edits, search,
//! show all, select, close) and read back what to draw.

use crate::config::{Config, SearchMode};
use crate::print::{self, LabelSet, PrintDocument};
use crate::record::Record;
use crate::search::Matcher;
use crate::selection::Selection;
use crate::store::RecordStore;

#[derive(Debug, Clone)]
pub struct Settings {
    pub mode: SearchMode,
    pub matcher: Matcher,
    pub labels: LabelSet,
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            mode: config.search.mode,
            matcher: Matcher {
                fields: config.search.fields.clone(),
                transliterate: config.search.transliterate,
            },
            labels: config.labels,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: SearchMode::Reactive,
            matcher: Matcher::default(),
            labels: LabelSet::English,
        }
    }
}

/// What produced the current result list; replayed after a reload.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Listing {
    Query(String),
    All,
}

#[derive(Debug)]
pub struct Directory {
    store: RecordStore,
    settings: Settings,
    query: String,
    listing: Listing,
    results: Vec<usize>,
    selection: Selection,
}

impl Directory {
    pub fn new(store: RecordStore, settings: Settings) -> Self {
        let mut directory = Self {
            store,
            settings,
            query: String::new(),
            listing: Listing::Query(String::new()),
            results: Vec::new(),
            selection: Selection::default(),
        };
        directory.refresh();
        directory
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn mode(&self) -> SearchMode {
        self.settings.mode
    }

    pub fn labels(&self) -> LabelSet {
        self.settings.labels
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Whether the list shows the whole store because of "show all".
    pub fn showing_all(&self) -> bool {
        self.listing == Listing::All
    }

    /// Update the query text. Reactive mode recomputes immediately; manual
    /// mode waits for [`Directory::search`].
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        if self.settings.mode == SearchMode::Reactive {
            self.run_query();
        }
    }

    /// The explicit search action.
    pub fn search(&mut self) {
        self.run_query();
    }

    /// List every record regardless of the query.
    pub fn show_all(&mut self) {
        self.listing = Listing::All;
        self.results = (0..self.store.len()).collect();
        tracing::debug!(count = self.results.len(), "showing all records");
    }

    fn run_query(&mut self) {
        self.listing = Listing::Query(self.query.clone());
        self.results = self
            .settings
            .matcher
            .filter_indices(self.store.records(), &self.query);
        tracing::debug!(query = %self.query, count = self.results.len(), "filtered records");
    }

    /// Recompute the list after the store changed, replaying the last action.
    fn refresh(&mut self) {
        match self.listing.clone() {
            Listing::All => self.show_all(),
            Listing::Query(last) => {
                self.results = self
                    .settings
                    .matcher
                    .filter_indices(self.store.records(), &last);
            }
        }
    }

    /// Swap in a freshly loaded store.
    pub fn replace_store(&mut self, store: RecordStore) {
        self.store = store;
        self.refresh();
        if self.selection.reconcile(&self.store) {
            tracing::debug!("selection cleared after reload");
        }
    }

    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    pub fn has_results(&self) -> bool {
        !self.results.is_empty()
    }

    pub fn results(&self) -> Vec<&Record> {
        self.results
            .iter()
            .filter_map(|&idx| self.store.get(idx))
            .collect()
    }

    /// Open the detail view for the result at `position`.
    pub fn select_result(&mut self, position: usize) -> bool {
        let Some(&index) = self.results.get(position) else {
            return false;
        };
        let selected = self.selection.select(&self.store, index);
        if selected {
            tracing::debug!(position, id = ?self.selection.id(), "record selected");
        }
        selected
    }

    pub fn select_id(&mut self, id: &str) -> bool {
        self.selection.select_id(&self.store, id)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn selected(&self) -> Option<&Record> {
        self.selection.index().and_then(|idx| self.store.get(idx))
    }

    pub fn has_selection(&self) -> bool {
        self.selection.is_active()
    }

    /// Print rendering of the whole result list; `None` when it is empty.
    pub fn print_document(&self) -> Option<PrintDocument> {
        let document = print::render_print_view(self.results(), self.settings.labels);
        (!document.is_empty()).then_some(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str, house: &str) -> Record {
        Record {
            id: id.into(),
            full_name: name.into(),
            house_no: house.into(),
            ..Record::default()
        }
    }

    fn sample_store() -> RecordStore {
        RecordStore::from_records(vec![
            record("A1", "Jane Doe", "12-B"),
            record("A2", "Asha Patil", "4"),
            record("A3", "Ravi Patil", "5"),
        ])
    }

    fn manual() -> Settings {
        Settings {
            mode: SearchMode::Manual,
            ..Settings::default()
        }
    }

    fn ids(directory: &Directory) -> Vec<&str> {
        directory
            .results()
            .into_iter()
            .map(|r| r.id.as_str())
            .collect()
    }

    #[test]
    fn reactive_mode_filters_on_each_edit() {
        let mut dir = Directory::new(sample_store(), Settings::default());
        assert_eq!(dir.result_count(), 0);
        dir.set_query("pat");
        assert_eq!(ids(&dir), vec!["A2", "A3"]);
        dir.set_query("ravi");
        assert_eq!(ids(&dir), vec!["A3"]);
        dir.set_query("");
        assert!(!dir.has_results());
    }

    #[test]
    fn manual_mode_waits_for_search() {
        let mut dir = Directory::new(sample_store(), manual());
        dir.set_query("patil");
        assert_eq!(dir.result_count(), 0);
        dir.search();
        assert_eq!(ids(&dir), vec!["A2", "A3"]);
        dir.set_query("jane");
        assert_eq!(ids(&dir), vec!["A2", "A3"]);
        dir.search();
        assert_eq!(ids(&dir), vec!["A1"]);
    }

    #[test]
    fn show_all_ignores_query() {
        let mut dir = Directory::new(sample_store(), manual());
        dir.set_query("zzz");
        dir.show_all();
        assert!(dir.showing_all());
        assert_eq!(ids(&dir), vec!["A1", "A2", "A3"]);
    }

    #[test]
    fn empty_store_never_matches() {
        let mut dir = Directory::new(RecordStore::empty(), Settings::default());
        dir.set_query("jane");
        assert!(!dir.has_results());
        assert!(dir.print_document().is_none());
        dir.show_all();
        assert!(!dir.has_results());
    }

    #[test]
    fn selecting_second_replaces_first() {
        let mut dir = Directory::new(sample_store(), Settings::default());
        assert!(dir.select_id("A1"));
        assert!(dir.select_id("A2"));
        assert_eq!(dir.selected().map(|r| r.id.as_str()), Some("A2"));
        dir.clear_selection();
        assert!(dir.selected().is_none());
    }

    #[test]
    fn select_result_uses_result_positions() {
        let mut dir = Directory::new(sample_store(), Settings::default());
        dir.set_query("patil");
        assert!(dir.select_result(1));
        assert_eq!(dir.selected().map(|r| r.id.as_str()), Some("A3"));
        assert!(!dir.select_result(7));
        assert_eq!(dir.selected().map(|r| r.id.as_str()), Some("A3"));
    }

    #[test]
    fn selection_does_not_change_results() {
        let mut dir = Directory::new(sample_store(), Settings::default());
        dir.set_query("patil");
        dir.select_result(0);
        assert_eq!(ids(&dir), vec!["A2", "A3"]);
        assert_eq!(dir.selected().unwrap().full_name, "Asha Patil");
    }

    #[test]
    fn reload_recomputes_and_reconciles() {
        let mut dir = Directory::new(sample_store(), Settings::default());
        dir.set_query("patil");
        dir.select_result(0);
        dir.replace_store(RecordStore::from_records(vec![
            record("A3", "Ravi Patil", "5"),
            record("A4", "Meena Patil", "6"),
        ]));
        assert_eq!(ids(&dir), vec!["A3", "A4"]);
        assert!(dir.selected().is_none());
    }

    #[test]
    fn reload_in_manual_mode_replays_last_search() {
        let mut dir = Directory::new(sample_store(), manual());
        dir.set_query("patil");
        dir.search();
        dir.set_query("jane");
        dir.replace_store(RecordStore::from_records(vec![
            record("A1", "Jane Doe", "12-B"),
            record("A9", "Kiran Patil", "9"),
        ]));
        assert_eq!(ids(&dir), vec!["A9"]);
        assert_eq!(dir.query(), "jane");
    }

    #[test]
    fn print_document_covers_results_not_selection() {
        let mut dir = Directory::new(sample_store(), Settings::default());
        dir.set_query("patil");
        dir.select_result(0);
        let doc = dir.print_document().unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.blocks[1].fields[0].value, "Ravi Patil");
    }
}
