use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use time::OffsetDateTime;

use crate::config::{Source, SourceConfig};
use crate::record::{self, Record};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fetch {url}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("malformed voter list from {origin}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The full voter list. Loaded once and never mutated; a reload builds a new
/// store.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<Record>,
    origin: Option<String>,
}

impl RecordStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a store, dropping records whose non-empty id was already seen.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut seen: HashSet<String> = HashSet::new();
        let mut kept = Vec::with_capacity(records.len());
        for record in records {
            if !record.id.is_empty() && !seen.insert(record.id.clone()) {
                tracing::warn!(id = %record.id, serial_no = record.serial_no, "dropping record with duplicate id");
                continue;
            }
            kept.push(record);
        }
        Self {
            records: kept,
            origin: None,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn position_of(&self, id: &str) -> Option<usize> {
        if id.is_empty() {
            return None;
        }
        self.records.iter().position(|record| record.id == id)
    }

    /// Where the records came from, for the header line.
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }
}

/// Load the store from a local file or an HTTP(S) URL.
pub fn load(config: &SourceConfig) -> Result<RecordStore, StoreError> {
    let origin = config.location.display();
    let raw = match &config.location {
        Source::File(path) => fs::read_to_string(path).map_err(|source| StoreError::Read {
            path: path.clone(),
            source,
        })?,
        Source::Url(url) => {
            let url = if config.cache_bust {
                cache_busted(url, OffsetDateTime::now_utc())
            } else {
                url.clone()
            };
            fetch(&url)?
        }
    };

    let records = record::parse_records(&raw).map_err(|source| StoreError::Parse {
        origin: origin.clone(),
        source,
    })?;
    tracing::info!(origin = %origin, count = records.len(), "loaded voter list");

    let mut store = RecordStore::from_records(records);
    store.origin = Some(origin);
    Ok(store)
}

fn fetch(url: &str) -> Result<String, StoreError> {
    let fetch_err = |source| StoreError::Fetch {
        url: url.to_string(),
        source,
    };
    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(fetch_err)?;
    client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text())
        .map_err(fetch_err)
}

/// Append a `t=<unix millis>` parameter so intermediaries serve a fresh copy.
fn cache_busted(url: &str, now: OffsetDateTime) -> String {
    let millis = now.unix_timestamp_nanos() / 1_000_000;
    let (base, fragment) = match url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (url, None),
    };
    let separator = if base.contains('?') { '&' } else { '?' };
    let mut busted = format!("{base}{separator}t={millis}");
    if let Some(fragment) = fragment {
        busted.push('#');
        busted.push_str(fragment);
    }
    busted
}
