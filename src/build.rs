use crate::parse::tokenize;
use crate::types::{InvertedIndex, SearchPosting, Section};
use std::collections::{HashMap, HashSet};

/// What the index remembers about a section once its text is tokenized
#[derive(Debug, Clone)]
pub struct SectionMeta {
    pub document_id: String,
    pub section_id: String,
    pub heading_text: String,
    pub heading_terms: HashSet<String>,
}

/// Count term frequencies and ordinal positions within one section's text
fn term_postings(text: &str) -> Vec<(String, u32, Vec<u32>)> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut rows: Vec<(String, u32, Vec<u32>)> = Vec::new();

    for (position, term) in tokenize(text).into_iter().enumerate() {
        let position = position as u32;
        match seen.get(&term) {
            Some(&row) => {
                rows[row].1 += 1;
                rows[row].2.push(position);
            }
            None => {
                seen.insert(term.clone(), rows.len());
                rows.push((term, 1, vec![position]));
            }
        }
    }

    rows
}

/// Build inverted index from sections
/// Maps each term to one posting per section containing it, in section order
pub fn build_index(sections: &[Section]) -> (InvertedIndex, Vec<SectionMeta>) {
    let mut index: InvertedIndex = HashMap::new();
    let mut metas = Vec::with_capacity(sections.len());

    for (ordinal, section) in sections.iter().enumerate() {
        for (term, frequency, positions) in term_postings(&section.plain_text) {
            index.entry(term.clone()).or_default().push(SearchPosting {
                term,
                document_id: section.document_id.clone(),
                section_id: section.section_id.clone(),
                frequency,
                positions,
                ordinal,
            });
        }

        metas.push(SectionMeta {
            document_id: section.document_id.clone(),
            section_id: section.section_id.clone(),
            heading_text: section.heading_text.clone(),
            heading_terms: tokenize(&section.heading_text).into_iter().collect(),
        });
    }

    (index, metas)
}
