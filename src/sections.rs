use crate::parse::{fence_marker, parse_heading, slugify, strip_line};
use crate::types::Section;
use std::collections::{HashMap, HashSet};

/// Section id used when a document has no headings at all
pub const ROOT_SECTION_ID: &str = "root";

/// Per-document section lists, in the order documents were indexed
#[derive(Debug, Default)]
pub struct SectionIndexer {
    documents: HashMap<String, Vec<Section>>,
    order: Vec<String>,
}

struct OpenSection {
    heading_text: String,
    level: usize,
    start_offset: usize,
    lines: Vec<String>,
}

impl SectionIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Section a document, replacing any sections previously stored for it
    pub fn index(&mut self, document_id: &str, raw_text: &str) -> &[Section] {
        let sections = split_sections(document_id, raw_text);
        self.insert(document_id, sections)
    }

    fn insert(&mut self, document_id: &str, sections: Vec<Section>) -> &[Section] {
        if !self.documents.contains_key(document_id) {
            self.order.push(document_id.to_string());
        }
        self.documents.insert(document_id.to_string(), sections);
        &self.documents[document_id]
    }

    /// Section many documents at once; parallel on native builds
    pub fn index_all(&mut self, documents: &[(String, String)]) {
        #[cfg(feature = "native")]
        let split: Vec<Vec<Section>> = {
            use rayon::prelude::*;
            documents
                .par_iter()
                .map(|(id, text)| split_sections(id, text))
                .collect()
        };
        #[cfg(not(feature = "native"))]
        let split: Vec<Vec<Section>> = documents
            .iter()
            .map(|(id, text)| split_sections(id, text))
            .collect();

        for ((id, _), sections) in documents.iter().zip(split) {
            self.insert(id, sections);
        }
    }

    pub fn sections(&self, document_id: &str) -> Option<&[Section]> {
        self.documents.get(document_id).map(Vec::as_slice)
    }

    pub fn is_indexed(&self, document_id: &str) -> bool {
        self.documents.contains_key(document_id)
    }

    /// Position of a section within its document
    pub fn section_index(&self, document_id: &str, section_id: &str) -> Option<usize> {
        self.sections(document_id)?
            .iter()
            .position(|s| s.section_id == section_id)
    }

    /// Map a byte offset to the section containing it
    /// Offsets past the end resolve to the last section
    pub fn section_at(&self, document_id: &str, offset: usize) -> Option<&Section> {
        let sections = self.sections(document_id)?;
        sections.get(section_position(sections, offset)?)
    }

    /// All sections, documents in indexing order, sections in document order
    pub fn all_sections(&self) -> Vec<Section> {
        self.order
            .iter()
            .filter_map(|id| self.documents.get(id))
            .flatten()
            .cloned()
            .collect()
    }
}

/// Binary search over section start offsets
pub fn section_position(sections: &[Section], offset: usize) -> Option<usize> {
    if sections.is_empty() {
        return None;
    }
    let after = sections.partition_point(|s| s.start_offset <= offset);
    Some(after.saturating_sub(1))
}

/// Split raw markdown into sections; never fails
pub fn split_sections(document_id: &str, raw_text: &str) -> Vec<Section> {
    let mut closed: Vec<OpenSection> = Vec::new();
    let mut current: Option<OpenSection> = None;
    let mut preamble: Vec<String> = Vec::new();
    let mut fence: Option<(char, usize)> = None;
    let mut offset = 0;

    for raw_line in raw_text.split_inclusive('\n') {
        let line_start = offset;
        offset += raw_line.len();
        let line = raw_line.trim_end_matches(['\n', '\r']);

        // Code fences: keep contents verbatim, drop the delimiters
        if let Some((fence_char, run)) = fence {
            let closes = fence_marker(line).is_some_and(|(c, r)| {
                c == fence_char && r >= run && line.trim().chars().all(|x| x == c)
            });
            if closes {
                fence = None;
            } else {
                push_line(&mut current, &mut preamble, line.to_string());
            }
            continue;
        }
        if let Some(marker) = fence_marker(line) {
            fence = Some(marker);
            continue;
        }

        if let Some((level, heading_text)) = parse_heading(line) {
            let opens = match &current {
                None => true,
                Some(open) => level <= open.level,
            };
            if opens {
                let first = current.is_none();
                let mut lines = if first {
                    std::mem::take(&mut preamble)
                } else {
                    Vec::new()
                };
                lines.push(heading_text.clone());
                let next = OpenSection {
                    lines,
                    heading_text,
                    level,
                    start_offset: if first { 0 } else { line_start },
                };
                if let Some(done) = current.replace(next) {
                    closed.push(done);
                }
                continue;
            }
            push_line(&mut current, &mut preamble, heading_text);
            continue;
        }

        push_line(&mut current, &mut preamble, strip_line(line));
    }

    match current {
        Some(open) => closed.push(open),
        None => closed.push(OpenSection {
            heading_text: String::new(),
            level: 0,
            start_offset: 0,
            lines: preamble,
        }),
    }

    finish(document_id, closed, raw_text.len())
}

fn push_line(current: &mut Option<OpenSection>, preamble: &mut Vec<String>, line: String) {
    match current {
        Some(open) => open.lines.push(line),
        None => preamble.push(line),
    }
}

fn finish(document_id: &str, open: Vec<OpenSection>, text_len: usize) -> Vec<Section> {
    let implicit_root = open.len() == 1 && open[0].level == 0;
    let mut slugs = SlugSet::default();
    let ends: Vec<usize> = open
        .iter()
        .skip(1)
        .map(|s| s.start_offset)
        .chain(std::iter::once(text_len))
        .collect();

    open.into_iter()
        .zip(ends)
        .map(|(s, end_offset)| {
            let section_id = if implicit_root {
                ROOT_SECTION_ID.to_string()
            } else {
                slugs.claim(slugify(&s.heading_text))
            };
            Section {
                document_id: document_id.to_string(),
                section_id,
                heading_text: s.heading_text,
                level: s.level,
                start_offset: s.start_offset,
                end_offset,
                plain_text: s.lines.join("\n").trim().to_string(),
            }
        })
        .collect()
}

/// Hands out unique ids: "setup", then "setup-1", "setup-2", ...
#[derive(Default)]
struct SlugSet {
    used: HashSet<String>,
    next_suffix: HashMap<String, usize>,
}

impl SlugSet {
    fn claim(&mut self, base: String) -> String {
        if self.used.insert(base.clone()) {
            return base;
        }
        let n = self.next_suffix.entry(base.clone()).or_insert(1);
        loop {
            let candidate = format!("{base}-{n}");
            *n += 1;
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}
