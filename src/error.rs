use thiserror::Error;

/// A document could not be retrieved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Document unavailable: {path} ({message})")]
pub struct FetchError {
    pub path: String,
    pub message: String,
}

impl FetchError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        FetchError {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Errors that can occur while driving the viewer
#[derive(Debug, Error)]
pub enum ViewerError {
    /// Document text could not be fetched
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Document id is not in the catalog or has no indexed sections yet
    #[error("Unknown document: {0}")]
    UnknownDocument(String),

    /// Section id is not present in the document's current sections
    #[error("Unknown section: {document_id}#{section_id}")]
    UnknownSection {
        document_id: String,
        section_id: String,
    },

    /// Catalog or viewer config could not be parsed or validated
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Persistent storage rejected a read or write
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<serde_json::Error> for ViewerError {
    fn from(e: serde_json::Error) -> Self {
        ViewerError::InvalidConfig(e.to_string())
    }
}
