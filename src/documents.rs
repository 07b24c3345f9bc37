use crate::error::FetchError;
use crate::types::DocumentRef;
use std::collections::HashMap;

/// Maps a document path to its raw markdown
pub trait Fetcher {
    fn fetch(&self, path: &str) -> Result<String, FetchError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentStatus {
    Pending,
    Loaded,
    Failed(FetchError),
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Loaded => "loaded",
            DocumentStatus::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Default)]
pub struct DocumentStore {
    texts: HashMap<String, String>,
    failures: HashMap<String, FetchError>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached text, or fetch it through `fetcher`
    pub fn fetch(
        &mut self,
        document: &DocumentRef,
        fetcher: &impl Fetcher,
    ) -> Result<&str, FetchError> {
        if !self.texts.contains_key(&document.id) {
            match fetcher.fetch(&document.path) {
                Ok(text) => {
                    self.insert(&document.id, text);
                }
                Err(e) => {
                    self.fail(&document.id, e.clone());
                    return Err(e);
                }
            }
        }
        Ok(&self.texts[&document.id])
    }

    /// Record fetched text; returns false if the document was already loaded
    pub fn insert(&mut self, document_id: &str, text: String) -> bool {
        if self.texts.contains_key(document_id) {
            return false;
        }
        self.failures.remove(document_id);
        self.texts.insert(document_id.to_string(), text);
        true
    }

    /// Record a failed fetch so the page can show "document unavailable"
    pub fn fail(&mut self, document_id: &str, error: FetchError) {
        if !self.texts.contains_key(document_id) {
            self.failures.insert(document_id.to_string(), error);
        }
    }

    pub fn text(&self, document_id: &str) -> Option<&str> {
        self.texts.get(document_id).map(String::as_str)
    }

    pub fn status(&self, document_id: &str) -> DocumentStatus {
        if self.texts.contains_key(document_id) {
            DocumentStatus::Loaded
        } else if let Some(e) = self.failures.get(document_id) {
            DocumentStatus::Failed(e.clone())
        } else {
            DocumentStatus::Pending
        }
    }
}

/// Blocking HTTP fetcher resolving paths against a base URL
#[cfg(feature = "native")]
pub struct HttpFetcher {
    base_url: String,
    client: reqwest::blocking::Client,
}

#[cfg(feature = "native")]
impl HttpFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpFetcher {
            base_url: base_url.into(),
            client: reqwest::blocking::Client::new(),
        }
    }
}

#[cfg(feature = "native")]
impl Fetcher for HttpFetcher {
    fn fetch(&self, path: &str) -> Result<String, FetchError> {
        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        self.client
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|e| FetchError::new(path, e.to_string()))
    }
}
