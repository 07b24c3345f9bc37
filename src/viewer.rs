use crate::catalog::Catalog;
use crate::config::ViewerConfig;
use crate::documents::{DocumentStatus, DocumentStore, Fetcher};
use crate::error::{FetchError, ViewerError};
use crate::keymap::Command;
use crate::navigation::NavigationController;
use crate::platform::{console_log, console_warn};
use crate::progress::{KeyValueStore, ProgressStore};
use crate::search::SearchIndex;
use crate::sections::SectionIndexer;
use crate::types::{NavigationSnapshot, RankedResult, Section};

/// One study session: catalog, loaded documents, search, progress and navigation
pub struct Viewer<S: KeyValueStore> {
    catalog: Catalog,
    config: ViewerConfig,
    documents: DocumentStore,
    indexer: SectionIndexer,
    search: SearchIndex,
    progress: ProgressStore<S>,
    navigation: NavigationController,
}

impl<S: KeyValueStore> Viewer<S> {
    pub fn new(catalog: Catalog, config: ViewerConfig, storage: S) -> Self {
        let progress = ProgressStore::load(storage, config.progress_key());
        Viewer {
            search: SearchIndex::new(config.heading_bonus),
            navigation: NavigationController::new(config.hysteresis_ratio),
            catalog,
            config,
            documents: DocumentStore::new(),
            indexer: SectionIndexer::new(),
            progress,
        }
    }

    fn known_document(&self, document_id: &str) -> Result<(), ViewerError> {
        match self.catalog.document(document_id) {
            Some(_) => Ok(()),
            None => Err(ViewerError::UnknownDocument(document_id.to_string())),
        }
    }

    /// Accept fetched text for a catalog document and section it
    ///
    /// The search index is rebuilt once no catalog document is still pending.
    pub fn load_document(&mut self, document_id: &str, text: String) -> Result<(), ViewerError> {
        self.known_document(document_id)?;
        if self.documents.insert(document_id, text) {
            let raw = self.documents.text(document_id).unwrap_or_default();
            let count = self.indexer.index(document_id, raw).len();
            console_log(format!("Loaded {document_id}: {count} sections"));
            self.rebuild_search_if_settled();
        }
        Ok(())
    }

    /// Record that a document could not be fetched
    pub fn document_failed(&mut self, document_id: &str, message: &str) -> Result<(), ViewerError> {
        let path = self
            .catalog
            .document(document_id)
            .map(|d| d.path.clone())
            .ok_or_else(|| ViewerError::UnknownDocument(document_id.to_string()))?;
        console_warn(format!("Document unavailable: {path} ({message})"));
        self.documents.fail(document_id, FetchError::new(path, message));
        self.rebuild_search_if_settled();
        Ok(())
    }

    /// Fetch one document through `fetcher`, caching and sectioning it
    pub fn fetch_document(
        &mut self,
        document_id: &str,
        fetcher: &impl Fetcher,
    ) -> Result<(), ViewerError> {
        let document = self
            .catalog
            .document(document_id)
            .cloned()
            .ok_or_else(|| ViewerError::UnknownDocument(document_id.to_string()))?;
        if self.indexer.is_indexed(document_id) {
            return Ok(());
        }
        let text = self.documents.fetch(&document, fetcher)?;
        self.indexer.index(document_id, text);
        self.rebuild_search_if_settled();
        Ok(())
    }

    /// Fetch every catalog document, then index and build search in one pass
    /// Returns the documents that failed to load
    pub fn fetch_all(&mut self, fetcher: &impl Fetcher) -> Vec<FetchError> {
        let mut failures = Vec::new();
        let mut fetched = Vec::new();
        let catalog_documents: Vec<_> = self.catalog.documents().cloned().collect();

        for document in &catalog_documents {
            if self.indexer.is_indexed(&document.id) {
                continue;
            }
            match self.documents.fetch(document, fetcher) {
                Ok(text) => fetched.push((document.id.clone(), text.to_string())),
                Err(e) => failures.push(e),
            }
        }

        self.indexer.index_all(&fetched);
        self.rebuild_search();
        failures
    }

    pub fn document_status(&self, document_id: &str) -> DocumentStatus {
        self.documents.status(document_id)
    }

    pub fn sections(&self, document_id: &str) -> Option<&[Section]> {
        self.indexer.sections(document_id)
    }

    fn rebuild_search_if_settled(&mut self) {
        let pending = self
            .catalog
            .documents()
            .any(|d| self.documents.status(&d.id) == DocumentStatus::Pending);
        if !pending {
            self.rebuild_search();
        }
    }

    /// Rebuild the search index from every loaded document
    pub fn rebuild_search(&mut self) {
        self.search.build(&self.indexer.all_sections());
    }

    /// Ranked results; a limit of 0 uses the configured default
    pub fn search(&self, query: &str, limit: usize) -> Vec<RankedResult> {
        let limit = if limit == 0 {
            self.config.default_search_limit
        } else {
            limit
        };
        self.search.query(query, limit)
    }

    fn live_section(&self, document_id: &str, section_id: &str) -> Result<(), ViewerError> {
        match self.indexer.section_index(document_id, section_id) {
            Some(_) => Ok(()),
            None => Err(ViewerError::UnknownSection {
                document_id: document_id.to_string(),
                section_id: section_id.to_string(),
            }),
        }
    }

    /// Flip a live section's done state; unknown sections are rejected untouched
    pub fn toggle_section(
        &mut self,
        document_id: &str,
        section_id: &str,
    ) -> Result<bool, ViewerError> {
        self.live_section(document_id, section_id)?;
        Ok(self.progress.toggle(document_id, section_id))
    }

    pub fn is_section_done(&self, document_id: &str, section_id: &str) -> bool {
        self.progress.is_done(document_id, section_id)
    }

    /// Done fraction of a document's live sections; 0 until it has loaded
    pub fn document_progress(&self, document_id: &str) -> f64 {
        self.indexer
            .sections(document_id)
            .map_or(0.0, |sections| self.progress.live_document_progress(sections))
    }

    /// Done fraction across the loaded documents of a topic
    pub fn topic_progress(&self, topic_id: &str) -> f64 {
        let Some(topic) = self.catalog.topic(topic_id) else {
            return 0.0;
        };
        self.progress.live_topic_progress(
            topic
                .documents
                .iter()
                .filter_map(|d| self.indexer.sections(&d.id)),
        )
    }

    pub fn reset_document_progress(&mut self, document_id: &str) {
        self.progress.reset_document(document_id);
    }

    pub fn open_document(&mut self, document_id: &str) -> Result<(), ViewerError> {
        self.navigation.open_document(&self.indexer, document_id)
    }

    pub fn jump_to_section(
        &mut self,
        document_id: &str,
        section_id: &str,
    ) -> Result<(), ViewerError> {
        self.navigation
            .jump_to_section(&self.indexer, document_id, section_id)
    }

    pub fn on_scroll(&mut self, offset_ratio: f64) -> Option<&str> {
        self.navigation.on_scroll(&self.indexer, offset_ratio)
    }

    pub fn next_section(&mut self) -> Option<&str> {
        self.navigation.next_section(&self.indexer)
    }

    pub fn prev_section(&mut self) -> Option<&str> {
        self.navigation.prev_section(&self.indexer)
    }

    /// Open the neighbouring document of the current topic; clamps at either end
    pub fn next_document(&mut self) -> Result<(), ViewerError> {
        self.step_document(true)
    }

    pub fn prev_document(&mut self) -> Result<(), ViewerError> {
        self.step_document(false)
    }

    fn step_document(&mut self, forward: bool) -> Result<(), ViewerError> {
        let Some(current) = self.navigation.open_document_id() else {
            return Ok(());
        };
        let Some(target) = self.catalog.adjacent_document(current, forward) else {
            return Ok(());
        };
        if target.id == current {
            return Ok(());
        }
        let target = target.id.clone();
        self.open_document(&target)
    }

    pub fn navigation(&self) -> NavigationSnapshot {
        self.navigation.snapshot()
    }

    /// Apply a keyboard shortcut; returns the command it mapped to
    pub fn handle_key(&mut self, key: &str) -> Option<Command> {
        let command = Command::from_key(key)?;
        let outcome = match command {
            Command::NextSection => {
                self.next_section();
                Ok(())
            }
            Command::PrevSection => {
                self.prev_section();
                Ok(())
            }
            Command::NextDocument => self.next_document(),
            Command::PrevDocument => self.prev_document(),
            Command::ToggleDone => {
                let snapshot = self.navigation.snapshot();
                match (snapshot.open_document_id, snapshot.visible_section_id) {
                    (Some(document_id), Some(section_id)) => {
                        self.toggle_section(&document_id, &section_id).map(|_| ())
                    }
                    _ => Ok(()),
                }
            }
            Command::FocusSearch => Ok(()),
        };
        if let Err(e) = outcome {
            console_warn(format!("Key '{key}' ignored: {e}"));
        }
        Some(command)
    }
}
