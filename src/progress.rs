use crate::error::ViewerError;
use crate::platform::{console_warn, now_ms};
use crate::types::{ProgressEntry, Section};
use std::collections::HashMap;

/// Key-value persistence backing the progress store
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), ViewerError>;
}

/// In-process store for tests and native builds
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: &str) -> Self {
        let mut store = Self::default();
        store.values.insert(key.to_string(), value.to_string());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ViewerError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Browser local storage, or memory when the page has none (private mode, tests)
pub enum BrowserStorage {
    Local(web_sys::Storage),
    Memory(MemoryStore),
}

impl BrowserStorage {
    pub fn open() -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten())
            {
                return BrowserStorage::Local(storage);
            }
            console_warn("localStorage unavailable, progress will not persist");
        }
        BrowserStorage::Memory(MemoryStore::new())
    }
}

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Option<String> {
        match self {
            BrowserStorage::Local(storage) => storage.get_item(key).ok().flatten(),
            BrowserStorage::Memory(memory) => memory.get(key),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ViewerError> {
        match self {
            BrowserStorage::Local(storage) => storage
                .set_item(key, value)
                .map_err(|e| ViewerError::Storage(format!("{e:?}"))),
            BrowserStorage::Memory(memory) => memory.set(key, value),
        }
    }
}

/// Completion state: document_id -> section_id -> entry
/// Done state per toggled section, written back as one JSON array on every change
pub struct ProgressStore<S: KeyValueStore> {
    storage: S,
    key: String,
    entries: HashMap<String, HashMap<String, ProgressEntry>>,
}

impl<S: KeyValueStore> ProgressStore<S> {
    /// Load entries stored under `key`; missing or malformed data means no progress
    pub fn load(storage: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let mut entries: HashMap<String, HashMap<String, ProgressEntry>> = HashMap::new();

        if let Some(raw) = storage.get(&key) {
            match serde_json::from_str::<Vec<ProgressEntry>>(&raw) {
                Ok(stored) => {
                    for entry in stored {
                        entries
                            .entry(entry.document_id.clone())
                            .or_default()
                            .insert(entry.section_id.clone(), entry);
                    }
                }
                Err(e) => console_warn(format!("Ignoring unreadable progress at '{key}': {e}")),
            }
        }

        ProgressStore {
            storage,
            key,
            entries,
        }
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Flip a section's done state and persist; returns the new state
    pub fn toggle(&mut self, document_id: &str, section_id: &str) -> bool {
        let sections = self.entries.entry(document_id.to_string()).or_default();
        let done = match sections.get_mut(section_id) {
            Some(entry) => {
                entry.done = !entry.done;
                entry.updated_at = now_ms();
                entry.done
            }
            None => {
                sections.insert(
                    section_id.to_string(),
                    ProgressEntry {
                        document_id: document_id.to_string(),
                        section_id: section_id.to_string(),
                        done: true,
                        updated_at: now_ms(),
                    },
                );
                true
            }
        };
        self.persist();
        done
    }

    pub fn is_done(&self, document_id: &str, section_id: &str) -> bool {
        self.entries
            .get(document_id)
            .and_then(|sections| sections.get(section_id))
            .is_some_and(|entry| entry.done)
    }

    /// Mark every entry of a document not-done
    pub fn reset_document(&mut self, document_id: &str) {
        let Some(sections) = self.entries.get_mut(document_id) else {
            return;
        };
        let now = now_ms();
        for entry in sections.values_mut().filter(|e| e.done) {
            entry.done = false;
            entry.updated_at = now;
        }
        self.persist();
    }

    /// Done section ids of a document, sorted
    pub fn done_sections(&self, document_id: &str) -> Vec<&str> {
        let mut done: Vec<&str> = self
            .entries
            .get(document_id)
            .map(|sections| {
                sections
                    .values()
                    .filter(|e| e.done)
                    .map(|e| e.section_id.as_str())
                    .collect()
            })
            .unwrap_or_default();
        done.sort_unstable();
        done
    }

    fn done_count(&self, document_id: &str) -> usize {
        self.entries
            .get(document_id)
            .map_or(0, |sections| sections.values().filter(|e| e.done).count())
    }

    /// Fraction of `total_sections` marked done, in [0, 1]
    pub fn document_progress(&self, document_id: &str, total_sections: usize) -> f64 {
        ratio(self.done_count(document_id).min(total_sections), total_sections)
    }

    /// Fraction of a document's current sections marked done; orphaned entries don't count
    pub fn live_document_progress(&self, sections: &[Section]) -> f64 {
        ratio(self.live_done_count(sections), sections.len())
    }

    fn live_done_count(&self, sections: &[Section]) -> usize {
        sections
            .iter()
            .filter(|s| self.is_done(&s.document_id, &s.section_id))
            .count()
    }

    /// Done sections over total sections across the given (document, total) pairs
    pub fn topic_progress(&self, documents: &[(&str, usize)]) -> f64 {
        let (done, total) = documents
            .iter()
            .fold((0, 0), |(done, total), (document_id, sections)| {
                (
                    done + self.done_count(document_id).min(*sections),
                    total + sections,
                )
            });
        ratio(done, total)
    }

    /// Topic progress over the live sections of each document
    pub fn live_topic_progress<'a>(
        &self,
        documents: impl IntoIterator<Item = &'a [Section]>,
    ) -> f64 {
        let (done, total) = documents.into_iter().fold((0, 0), |(done, total), sections| {
            (done + self.live_done_count(sections), total + sections.len())
        });
        ratio(done, total)
    }

    /// Every stored entry, ordered by document then section
    pub fn entries(&self) -> Vec<ProgressEntry> {
        let mut all: Vec<ProgressEntry> = self
            .entries
            .values()
            .flat_map(|sections| sections.values().cloned())
            .collect();
        all.sort_by(|a, b| {
            (&a.document_id, &a.section_id).cmp(&(&b.document_id, &b.section_id))
        });
        all
    }

    fn persist(&mut self) {
        let json = match serde_json::to_string(&self.entries()) {
            Ok(json) => json,
            Err(e) => {
                console_warn(format!("Failed to serialize progress: {e}"));
                return;
            }
        };
        if let Err(e) = self.storage.set(&self.key, &json) {
            console_warn(format!("Failed to persist progress: {e}"));
        }
    }
}

fn ratio(done: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        done as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::split_sections;

    const KEY: &str = "test:progress";

    fn store() -> ProgressStore<MemoryStore> {
        ProgressStore::load(MemoryStore::new(), KEY)
    }

    struct FullStore;

    impl KeyValueStore for FullStore {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), ViewerError> {
            Err(ViewerError::Storage("quota exceeded".to_string()))
        }
    }

    #[test]
    fn test_toggle_twice_restores_state() {
        let mut progress = store();
        assert!(!progress.is_done("intro", "setup"));
        assert!(progress.toggle("intro", "setup"));
        assert!(progress.is_done("intro", "setup"));
        assert!(!progress.toggle("intro", "setup"));
        assert!(!progress.is_done("intro", "setup"));
        // The not-done entry is kept
        assert_eq!(progress.entries().len(), 1);
    }

    #[test]
    fn test_intro_scenario() {
        let mut progress = store();
        progress.toggle("intro", "setup");
        assert_eq!(progress.document_progress("intro", 3), 1.0 / 3.0);
        progress.toggle("intro", "usage");
        assert_eq!(progress.document_progress("intro", 3), 2.0 / 3.0);
        progress.toggle("intro", "setup");
        assert_eq!(progress.document_progress("intro", 3), 1.0 / 3.0);
    }

    #[test]
    fn test_document_progress_bounds() {
        let mut progress = store();
        assert_eq!(progress.document_progress("intro", 0), 0.0);
        assert_eq!(progress.document_progress("intro", 7), 0.0);

        let mut last = 0.0;
        for section in ["a", "b", "c"] {
            progress.toggle("intro", section);
            let now = progress.document_progress("intro", 3);
            assert!(now >= last);
            last = now;
        }
        assert_eq!(last, 1.0);
        assert_eq!(progress.document_progress("intro", 2), 1.0);
    }

    #[test]
    fn test_persists_and_reloads() {
        let mut progress = store();
        progress.toggle("intro", "setup");
        progress.toggle("guide", "usage");

        let reloaded = ProgressStore::load(progress.into_storage(), KEY);
        assert!(reloaded.is_done("intro", "setup"));
        assert!(reloaded.is_done("guide", "usage"));
        assert!(!reloaded.is_done("guide", "setup"));
    }

    #[test]
    fn test_malformed_storage_means_no_progress() {
        let progress = ProgressStore::load(MemoryStore::with_value(KEY, "{not json"), KEY);
        assert!(progress.entries().is_empty());
        assert!(!progress.is_done("intro", "setup"));
    }

    #[test]
    fn test_write_failure_keeps_memory_state() {
        let mut progress = ProgressStore::load(FullStore, KEY);
        assert!(progress.toggle("intro", "setup"));
        assert!(progress.is_done("intro", "setup"));
    }

    #[test]
    fn test_orphans_ignored_by_live_progress() {
        let mut progress = store();
        progress.toggle("intro", "old-heading");
        progress.toggle("intro", "setup");

        let sections = split_sections("intro", "# Overview\n# Setup\n# Usage\n");
        assert_eq!(progress.live_document_progress(&sections), 1.0 / 3.0);
        // Still stored
        assert!(progress.is_done("intro", "old-heading"));
    }

    #[test]
    fn test_topic_progress() {
        let mut progress = store();
        progress.toggle("a", "one");
        progress.toggle("b", "one");
        progress.toggle("b", "two");
        assert_eq!(progress.topic_progress(&[("a", 2), ("b", 2)]), 0.75);
        assert_eq!(progress.topic_progress(&[("a", 2), ("c", 2)]), 0.25);
        assert_eq!(progress.topic_progress(&[]), 0.0);

        let a = split_sections("a", "# One\n# Two\n");
        let b = split_sections("b", "# One\n# Two\n");
        assert_eq!(progress.live_topic_progress([a.as_slice(), b.as_slice()]), 0.75);
    }

    #[test]
    fn test_reset_document() {
        let mut progress = store();
        progress.toggle("a", "one");
        progress.toggle("a", "two");
        progress.toggle("b", "one");
        assert_eq!(progress.done_sections("a"), vec!["one", "two"]);
        progress.reset_document("a");
        assert!(progress.done_sections("a").is_empty());
        assert!(progress.is_done("b", "one"));
    }
}
