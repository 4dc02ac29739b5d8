use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::LabResult;
use crate::storage::KeyValueStore;

pub const HISTORY_STORAGE_KEY: &str = "json_prompting_history";
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// A prompt/schema pair that produced a successful generation
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Creation timestamp
    pub id: String,
    pub prompt: String,
    pub schema: String,
}

impl HistoryEntry {
    fn matches(&self, prompt: &str, schema: &str) -> bool {
        self.prompt == prompt && self.schema == schema
    }
}

/// Most-recent-first, bounded, de-duplicated history persisted on every change.
#[derive(Debug)]
pub struct HistoryStore<S> {
    store: S,
    entries: Vec<HistoryEntry>,
    limit: usize,
}

impl<S: KeyValueStore> HistoryStore<S> {
    /// Loads the history. Missing or unreadable data yields an empty history.
    pub fn load(store: S) -> Self {
        Self::load_with_limit(store, DEFAULT_HISTORY_LIMIT)
    }

    pub fn load_with_limit(store: S, limit: usize) -> Self {
        let limit = limit.max(1);
        let mut entries = match store.get(HISTORY_STORAGE_KEY) {
            Ok(Some(json_str)) => match serde_json::from_str::<Vec<HistoryEntry>>(&json_str) {
                Ok(entries) => {
                    debug!(count = entries.len(), "Loaded history");
                    entries
                }
                Err(e) => {
                    warn!(error = %e, "Failed to parse stored history, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read stored history, starting empty");
                Vec::new()
            }
        };
        entries.truncate(limit);

        Self {
            store,
            entries,
            limit,
        }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn find(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Records a pair at the front. Returns `false` (and changes nothing)
    /// when the exact pair is already present.
    pub fn add(&mut self, prompt: &str, schema: &str) -> LabResult<bool> {
        if self.entries.iter().any(|entry| entry.matches(prompt, schema)) {
            debug!("History already contains this prompt/schema pair");
            return Ok(false);
        }

        let entry = HistoryEntry {
            id: self.next_id(),
            prompt: prompt.to_string(),
            schema: schema.to_string(),
        };
        let mut entries = Vec::with_capacity(self.limit);
        entries.push(entry);
        entries.extend(self.entries.iter().take(self.limit - 1).cloned());
        self.commit(entries)?;
        Ok(true)
    }

    pub fn clear(&mut self) -> LabResult<()> {
        self.commit(Vec::new())
    }

    /// Writes the current entries through to storage
    pub fn persist(&self) -> LabResult<()> {
        Self::write(&self.store, &self.entries)
    }

    /// Replaces the in-memory list only once storage has accepted it.
    fn commit(&mut self, entries: Vec<HistoryEntry>) -> LabResult<()> {
        Self::write(&self.store, &entries)?;
        self.entries = entries;
        Ok(())
    }

    fn write(store: &S, entries: &[HistoryEntry]) -> LabResult<()> {
        let json_str = serde_json::to_string(entries)?;
        store.set(HISTORY_STORAGE_KEY, &json_str)
    }

    fn next_id(&self) -> String {
        let mut id = Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true);
        // Clock granularity can repeat a timestamp
        while self.find(&id).is_some() {
            id.push('+');
        }
        id
    }
}
