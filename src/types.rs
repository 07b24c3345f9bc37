use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Topic: an ordered reading list of documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub documents: Vec<DocumentRef>,
}

/// Reference to a fetchable markdown document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRef {
    pub id: String,
    /// Filled in from the enclosing topic when omitted
    #[serde(default)]
    pub topic_id: String,
    pub title: String,
    pub path: String,
}

/// Heading-delimited span of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub document_id: String,
    pub section_id: String,
    pub heading_text: String,
    /// Heading depth; 0 for the implicit `root` section
    pub level: usize,
    /// Byte offset of the section start (inclusive)
    pub start_offset: usize,
    /// Byte offset of the section end (exclusive)
    pub end_offset: usize,
    pub plain_text: String,
}

/// Completion record for one (document, section) pair the user has toggled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    pub document_id: String,
    pub section_id: String,
    pub done: bool,
    /// Epoch milliseconds of the last toggle
    pub updated_at: f64,
}

/// One (term, section) row of the inverted index
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPosting {
    pub term: String,
    pub document_id: String,
    pub section_id: String,
    pub frequency: u32,
    /// Ordinal token positions within the section's plain text
    pub positions: Vec<u32>,
    /// Position of the section in build order, used for tie-breaking
    #[serde(skip)]
    pub(crate) ordinal: usize,
}

/// Inverted index: term -> postings in section build order
pub type InvertedIndex = HashMap<String, Vec<SearchPosting>>;

/// Search result with section info and relevance score
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResult {
    pub document_id: String,
    pub section_id: String,
    pub heading_text: String,
    pub score: f32,
    pub matched_terms: Vec<String>,
    /// Token positions of every matched term, ascending
    pub positions: Vec<u32>,
}

/// Serializable view of the navigation state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationSnapshot {
    pub open_document_id: Option<String>,
    pub visible_section_id: Option<String>,
    pub scroll_progress_ratio: f64,
}
