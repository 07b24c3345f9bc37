use crate::error::ViewerError;
use crate::platform::console_warn;
use crate::sections::{section_position, SectionIndexer};
use crate::types::{NavigationSnapshot, Section};

#[derive(Debug, Clone, PartialEq)]
pub struct OpenDocument {
    pub document_id: String,
    pub visible_section_id: String,
    pub visible_index: usize,
    pub scroll_ratio: f64,
    /// Byte offset of the last scroll position, for direction detection
    last_offset: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum NavigationState {
    #[default]
    Closed,
    Open(OpenDocument),
}

/// Open document and scrollspy state; invalid jumps leave it untouched
#[derive(Debug, Default)]
pub struct NavigationController {
    state: NavigationState,
    hysteresis_ratio: f64,
}

impl NavigationController {
    pub fn new(hysteresis_ratio: f64) -> Self {
        NavigationController {
            state: NavigationState::Closed,
            hysteresis_ratio,
        }
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn open_document_id(&self) -> Option<&str> {
        match &self.state {
            NavigationState::Open(open) => Some(&open.document_id),
            NavigationState::Closed => None,
        }
    }

    pub fn visible_section_id(&self) -> Option<&str> {
        match &self.state {
            NavigationState::Open(open) => Some(&open.visible_section_id),
            NavigationState::Closed => None,
        }
    }

    pub fn snapshot(&self) -> NavigationSnapshot {
        match &self.state {
            NavigationState::Closed => NavigationSnapshot {
                open_document_id: None,
                visible_section_id: None,
                scroll_progress_ratio: 0.0,
            },
            NavigationState::Open(open) => NavigationSnapshot {
                open_document_id: Some(open.document_id.clone()),
                visible_section_id: Some(open.visible_section_id.clone()),
                scroll_progress_ratio: open.scroll_ratio,
            },
        }
    }

    /// Open a document at its first section, discarding any scroll state
    pub fn open_document(
        &mut self,
        indexer: &SectionIndexer,
        document_id: &str,
    ) -> Result<(), ViewerError> {
        let sections = indexed(indexer, document_id)?;
        self.state = NavigationState::Open(at_section(document_id, sections, 0));
        Ok(())
    }

    /// Jump to a section, opening its document first if needed
    /// Unknown targets are logged and leave the state unchanged
    pub fn jump_to_section(
        &mut self,
        indexer: &SectionIndexer,
        document_id: &str,
        section_id: &str,
    ) -> Result<(), ViewerError> {
        let sections = indexed(indexer, document_id)?;
        let Some(index) = sections.iter().position(|s| s.section_id == section_id) else {
            console_warn(format!(
                "Ignoring jump to unknown section {document_id}#{section_id}"
            ));
            return Err(ViewerError::UnknownSection {
                document_id: document_id.to_string(),
                section_id: section_id.to_string(),
            });
        };
        self.state = NavigationState::Open(at_section(document_id, sections, index));
        Ok(())
    }

    pub fn next_section(&mut self, indexer: &SectionIndexer) -> Option<&str> {
        self.step(indexer, true)
    }

    pub fn prev_section(&mut self, indexer: &SectionIndexer) -> Option<&str> {
        self.step(indexer, false)
    }

    /// Move to the adjacent section, clamped at either end
    fn step(&mut self, indexer: &SectionIndexer, forward: bool) -> Option<&str> {
        let NavigationState::Open(open) = &mut self.state else {
            return None;
        };
        let sections = indexer.sections(&open.document_id)?;
        let last = sections.len().checked_sub(1)?;
        let target = if forward {
            (open.visible_index + 1).min(last)
        } else {
            open.visible_index.saturating_sub(1).min(last)
        };
        *open = at_section(&open.document_id, sections, target);
        Some(&open.visible_section_id)
    }

    /// Scrollspy update from the viewport's position as a fraction of the document
    pub fn on_scroll(&mut self, indexer: &SectionIndexer, offset_ratio: f64) -> Option<&str> {
        let hysteresis_ratio = self.hysteresis_ratio;
        let NavigationState::Open(open) = &mut self.state else {
            return None;
        };
        let sections = indexer.sections(&open.document_id)?;
        if !offset_ratio.is_finite() {
            return Some(&open.visible_section_id);
        }

        let ratio = offset_ratio.clamp(0.0, 1.0);
        let len = document_len(sections);
        let offset = (ratio * len as f64).floor() as usize;
        let previous_offset = open.last_offset;
        open.scroll_ratio = ratio;
        open.last_offset = offset;

        let candidate = section_position(sections, offset)?;
        let visible = open.visible_index.min(sections.len() - 1);
        if candidate == visible {
            return Some(&open.visible_section_id);
        }

        // At most half the section being entered
        let entering = &sections[candidate];
        let band = ((hysteresis_ratio * len as f64) as usize)
            .min((entering.end_offset - entering.start_offset) / 2);
        let commit = if ratio <= 0.0 || ratio >= 1.0 || candidate.abs_diff(visible) > 1 {
            true
        } else if candidate > visible {
            offset > previous_offset && offset >= sections[candidate].start_offset + band
        } else {
            offset < previous_offset && offset + band < sections[visible].start_offset
        };

        if commit {
            open.visible_index = candidate;
            open.visible_section_id = sections[candidate].section_id.clone();
        }
        Some(&open.visible_section_id)
    }
}

fn indexed<'a>(
    indexer: &'a SectionIndexer,
    document_id: &str,
) -> Result<&'a [Section], ViewerError> {
    match indexer.sections(document_id) {
        Some(sections) if !sections.is_empty() => Ok(sections),
        _ => {
            console_warn(format!("Ignoring navigation to unloaded document {document_id}"));
            Err(ViewerError::UnknownDocument(document_id.to_string()))
        }
    }
}

fn document_len(sections: &[Section]) -> usize {
    sections.last().map_or(0, |s| s.end_offset)
}

fn at_section(document_id: &str, sections: &[Section], index: usize) -> OpenDocument {
    let start = sections[index].start_offset;
    let len = document_len(sections);
    OpenDocument {
        document_id: document_id.to_string(),
        visible_section_id: sections[index].section_id.clone(),
        visible_index: index,
        scroll_ratio: if len == 0 {
            0.0
        } else {
            start as f64 / len as f64
        },
        last_offset: start,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Four sections of exactly 100 bytes each: a, b, c, d
    fn indexer() -> SectionIndexer {
        let mut indexer = SectionIndexer::new();
        let mut text = String::new();
        for name in ["A", "B", "C", "D"] {
            let heading = format!("# {name}\n");
            text.push_str(&heading);
            text.push_str(&"x".repeat(99 - heading.len()));
            text.push('\n');
        }
        indexer.index("doc1", &text);
        indexer.index("doc2", "# Only\nbody\n");
        indexer
    }

    #[test]
    fn test_open_document_starts_at_first_section() {
        let idx = indexer();
        let mut nav = NavigationController::new(0.02);
        assert_eq!(nav.state(), &NavigationState::Closed);

        nav.open_document(&idx, "doc1").unwrap();
        assert_eq!(nav.visible_section_id(), Some("a"));
        assert_eq!(nav.snapshot().scroll_progress_ratio, 0.0);

        assert!(nav.open_document(&idx, "unloaded").is_err());
        assert_eq!(nav.open_document_id(), Some("doc1"));
    }

    #[test]
    fn test_jump_to_unknown_section_is_noop() {
        let idx = indexer();
        let mut nav = NavigationController::new(0.02);
        nav.open_document(&idx, "doc1").unwrap();
        nav.jump_to_section(&idx, "doc1", "c").unwrap();
        let before = nav.snapshot();

        let err = nav.jump_to_section(&idx, "doc1", "nonexistent").unwrap_err();
        assert!(matches!(err, ViewerError::UnknownSection { .. }));
        assert_eq!(nav.snapshot(), before);

        assert!(nav.jump_to_section(&idx, "nodoc", "a").is_err());
        assert_eq!(nav.snapshot(), before);
    }

    #[test]
    fn test_jump_across_documents() {
        let idx = indexer();
        let mut nav = NavigationController::new(0.02);
        nav.jump_to_section(&idx, "doc1", "b").unwrap();
        assert_eq!(nav.snapshot().scroll_progress_ratio, 0.25);

        nav.jump_to_section(&idx, "doc2", "only").unwrap();
        assert_eq!(nav.open_document_id(), Some("doc2"));
        assert_eq!(nav.visible_section_id(), Some("only"));
    }

    #[test]
    fn test_next_prev_clamp() {
        let idx = indexer();
        let mut nav = NavigationController::new(0.02);
        assert_eq!(nav.next_section(&idx), None);

        nav.open_document(&idx, "doc1").unwrap();
        assert_eq!(nav.prev_section(&idx), Some("a"));
        assert_eq!(nav.next_section(&idx), Some("b"));
        assert_eq!(nav.next_section(&idx), Some("c"));
        assert_eq!(nav.next_section(&idx), Some("d"));
        assert_eq!(nav.next_section(&idx), Some("d"));
        assert_eq!(nav.prev_section(&idx), Some("c"));
    }

    #[test]
    fn test_scroll_tracks_sections() {
        let idx = indexer();
        let mut nav = NavigationController::new(0.02);
        nav.open_document(&idx, "doc1").unwrap();

        assert_eq!(nav.on_scroll(&idx, 0.1), Some("a"));
        assert_eq!(nav.on_scroll(&idx, 0.3), Some("b"));
        assert_eq!(nav.on_scroll(&idx, 0.6), Some("c"));
        assert_eq!(nav.on_scroll(&idx, 0.4), Some("b"));
        assert_eq!(nav.on_scroll(&idx, 0.1), Some("a"));
        assert_eq!(nav.snapshot().scroll_progress_ratio, 0.1);
    }

    /// Ratio landing on byte `offset` of the 400 byte document
    fn at(offset: usize) -> f64 {
        (offset as f64 + 0.5) / 400.0
    }

    #[test]
    fn test_boundary_jitter_does_not_flicker() {
        let idx = indexer();
        // band = 8 bytes
        let mut nav = NavigationController::new(0.02);
        nav.open_document(&idx, "doc1").unwrap();

        // Just past the b boundary but inside the band: stays on a
        assert_eq!(nav.on_scroll(&idx, at(101)), Some("a"));
        assert_eq!(nav.on_scroll(&idx, at(110)), Some("b"));
        // Jitter back across the boundary, within the band
        assert_eq!(nav.on_scroll(&idx, at(98)), Some("b"));
        assert_eq!(nav.on_scroll(&idx, at(101)), Some("b"));
        assert_eq!(nav.on_scroll(&idx, at(95)), Some("b"));
        // Clearly back in a
        assert_eq!(nav.on_scroll(&idx, at(80)), Some("a"));
    }

    /// Section ids visible while scrolling byte by byte over `offsets`
    fn visited(
        nav: &mut NavigationController,
        idx: &SectionIndexer,
        offsets: impl Iterator<Item = usize>,
        len: usize,
    ) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for offset in offsets {
            let ratio = (offset as f64 + 0.5) / len as f64;
            let id = nav.on_scroll(idx, ratio).unwrap().to_string();
            if seen.last() != Some(&id) {
                seen.push(id);
            }
        }
        seen
    }

    #[test]
    fn test_short_section_is_not_skipped() {
        let mut idx = SectionIndexer::new();
        let long = "x".repeat(995);
        let text = format!("# A\n{long}\n# B\nhi\n# C\n{long}\n");
        idx.index("doc", &text);
        let len = text.len();
        // band = 20 bytes, far wider than b
        let mut nav = NavigationController::new(0.01);
        nav.open_document(&idx, "doc").unwrap();

        assert_eq!(visited(&mut nav, &idx, 0..len, len), vec!["a", "b", "c"]);
        assert_eq!(visited(&mut nav, &idx, (0..len).rev(), len), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_scroll_edges_and_far_jumps() {
        let idx = indexer();
        let mut nav = NavigationController::new(0.02);
        nav.open_document(&idx, "doc1").unwrap();

        assert_eq!(nav.on_scroll(&idx, 0.9), Some("d"));
        assert_eq!(nav.on_scroll(&idx, 0.0), Some("a"));
        assert_eq!(nav.on_scroll(&idx, 2.0), Some("d"));
        assert_eq!(nav.snapshot().scroll_progress_ratio, 1.0);
        assert_eq!(nav.on_scroll(&idx, f64::NAN), Some("d"));
    }

    #[test]
    fn test_closed_ignores_scroll() {
        let idx = indexer();
        let mut nav = NavigationController::new(0.02);
        assert_eq!(nav.on_scroll(&idx, 0.5), None);
        assert_eq!(nav.snapshot().open_document_id, None);
    }
}
