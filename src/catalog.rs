use crate::error::ViewerError;
use crate::types::{DocumentRef, Topic};
use std::collections::{HashMap, HashSet};

/// Validated topic list with document lookups
#[derive(Debug, Default)]
pub struct Catalog {
    topics: Vec<Topic>,
    /// document_id -> (topic index, document index)
    locations: HashMap<String, (usize, usize)>,
}

impl Catalog {
    /// Validate topics: unique document ids, `topicId` matching the enclosing topic
    pub fn new(mut topics: Vec<Topic>) -> Result<Self, ViewerError> {
        let mut locations = HashMap::new();
        let mut topic_ids = HashSet::new();

        for (t, topic) in topics.iter_mut().enumerate() {
            if !topic_ids.insert(topic.id.clone()) {
                return Err(ViewerError::InvalidConfig(format!(
                    "duplicate topic id '{}'",
                    topic.id
                )));
            }
            for (d, doc) in topic.documents.iter_mut().enumerate() {
                if doc.topic_id.is_empty() {
                    doc.topic_id = topic.id.clone();
                } else if doc.topic_id != topic.id {
                    return Err(ViewerError::InvalidConfig(format!(
                        "document '{}' declares topic '{}' but is listed under '{}'",
                        doc.id, doc.topic_id, topic.id
                    )));
                }
                if locations.insert(doc.id.clone(), (t, d)).is_some() {
                    return Err(ViewerError::InvalidConfig(format!(
                        "duplicate document id '{}'",
                        doc.id
                    )));
                }
            }
        }

        Ok(Catalog { topics, locations })
    }

    pub fn from_json(json: &str) -> Result<Self, ViewerError> {
        let topics: Vec<Topic> = serde_json::from_str(json)?;
        Self::new(topics)
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn topic(&self, topic_id: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.id == topic_id)
    }

    pub fn document(&self, document_id: &str) -> Option<&DocumentRef> {
        let &(t, d) = self.locations.get(document_id)?;
        self.topics.get(t)?.documents.get(d)
    }

    pub fn topic_of(&self, document_id: &str) -> Option<&Topic> {
        let &(t, _) = self.locations.get(document_id)?;
        self.topics.get(t)
    }

    /// Every document, topics in order, documents in reading order
    pub fn documents(&self) -> impl Iterator<Item = &DocumentRef> {
        self.topics.iter().flat_map(|t| t.documents.iter())
    }

    /// Neighbouring document in the same topic; clamps at either end
    pub fn adjacent_document(&self, document_id: &str, forward: bool) -> Option<&DocumentRef> {
        let &(t, d) = self.locations.get(document_id)?;
        let documents = &self.topics.get(t)?.documents;
        let target = if forward {
            (d + 1).min(documents.len().saturating_sub(1))
        } else {
            d.saturating_sub(1)
        };
        documents.get(target)
    }
}
