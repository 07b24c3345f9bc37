use crate::build::{build_index, SectionMeta};
use crate::parse::parse_query;
use crate::platform::{console_log, perf_now};
use crate::rank;
use crate::types::{InvertedIndex, RankedResult, SearchPosting, Section};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct SearchIndex {
    index: InvertedIndex,
    sections: Vec<SectionMeta>,
    heading_bonus: f32,
}

/// Accumulated match data for one section during a query
#[derive(Default)]
struct Hit {
    frequency: u32,
    matched_terms: Vec<String>,
    positions: Vec<u32>,
}

impl SearchIndex {
    pub fn new(heading_bonus: f32) -> Self {
        SearchIndex {
            heading_bonus,
            ..Default::default()
        }
    }

    /// Replace the whole index with one built from `sections`
    pub fn build(&mut self, sections: &[Section]) {
        let start = perf_now();
        let (index, metas) = build_index(sections);
        self.index = index;
        self.sections = metas;
        console_log(format!(
            "[perf] build sections={} terms={} | total={:.1}ms",
            self.sections.len(),
            self.index.len(),
            perf_now() - start
        ));
    }

    pub fn term_count(&self) -> usize {
        self.index.len()
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn postings(&self, term: &str) -> &[SearchPosting] {
        self.index.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ranked sections matching `text`
    ///
    /// Multi-term queries prefer sections containing every term and fall back
    /// to sections containing any term when no section has them all.
    pub fn query(&self, text: &str, limit: usize) -> Vec<RankedResult> {
        let start = perf_now();
        let terms = parse_query(text);
        if terms.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut hits: HashMap<usize, Hit> = HashMap::new();
        let mut total_postings = 0usize;
        for term in &terms {
            let postings = self.postings(term);
            total_postings += postings.len();
            for posting in postings {
                let hit = hits.entry(posting.ordinal).or_default();
                hit.frequency += posting.frequency;
                hit.matched_terms.push(term.clone());
                hit.positions.extend_from_slice(&posting.positions);
            }
        }

        let has_full_match = hits.values().any(|h| h.matched_terms.len() == terms.len());
        if has_full_match {
            hits.retain(|_, h| h.matched_terms.len() == terms.len());
        }

        let keyed: Vec<(rank::RankKey, usize)> = hits
            .iter()
            .map(|(&ordinal, hit)| {
                let heading_hit = terms
                    .iter()
                    .any(|t| self.sections[ordinal].heading_terms.contains(t));
                let score = rank::score(hit.frequency, heading_hit, self.heading_bonus);
                (rank::rank_key(score, ordinal), ordinal)
            })
            .collect();

        let results: Vec<RankedResult> = rank::top_n(&keyed, limit)
            .into_iter()
            .filter_map(|((score, _), ordinal)| {
                let meta = self.sections.get(ordinal)?;
                let hit = hits.remove(&ordinal)?;
                let mut positions = hit.positions;
                positions.sort_unstable();
                Some(RankedResult {
                    document_id: meta.document_id.clone(),
                    section_id: meta.section_id.clone(),
                    heading_text: meta.heading_text.clone(),
                    score,
                    matched_terms: hit.matched_terms,
                    positions,
                })
            })
            .collect();

        console_log(format!(
            "[perf] query='{}' terms={} postings={} and={} | total={:.1}ms",
            text,
            terms.len(),
            total_postings,
            has_full_match,
            perf_now() - start
        ));

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::split_sections;

    fn index_of(docs: &[(&str, &str)]) -> SearchIndex {
        let sections: Vec<Section> = docs
            .iter()
            .flat_map(|(id, text)| split_sections(id, text))
            .collect();
        let mut index = SearchIndex::new(10.0);
        index.build(&sections);
        index
    }

    fn found(results: &[RankedResult]) -> Vec<(&str, &str)> {
        results
            .iter()
            .map(|r| (r.document_id.as_str(), r.section_id.as_str()))
            .collect()
    }

    #[test]
    fn test_single_term_finds_exactly_containing_sections() {
        let index = index_of(&[
            ("a", "# One\nThe Cache is warm\n# Two\nnothing here\n"),
            ("b", "# Three\nCACHE cache\n# Four\ncached is a different word\n"),
        ]);
        let results = index.query("cache", 10);
        assert_eq!(found(&results), vec![("b", "three"), ("a", "one")]);
        assert_eq!(results[0].score, 2.0);
    }

    #[test]
    fn test_and_then_or_fallback() {
        let index = index_of(&[
            ("a", "# Notes\nA cache stores values.\n"),
            ("b", "# Notes\nA cache needs an eviction policy.\n"),
        ]);

        let both = index.query("cache eviction", 10);
        assert_eq!(found(&both), vec![("b", "notes")]);

        let either = index.query("eviction stores", 10);
        assert_eq!(either.len(), 2);

        let one = index.query("cache", 10);
        let again = index.query("cache", 10);
        assert_eq!(found(&one), found(&again));
        assert_eq!(found(&one), vec![("a", "notes"), ("b", "notes")]);
    }

    #[test]
    fn test_inline_code_is_searchable() {
        let index = index_of(&[(
            "rust",
            "# Maps\nUse `HashMap<String, Vec<u8>>` for lookups.\n# Other\nNothing here.\n",
        )]);
        assert_eq!(found(&index.query("string", 10)), vec![("rust", "maps")]);
        assert_eq!(found(&index.query("vec", 10)), vec![("rust", "maps")]);
        assert_eq!(found(&index.query("hashmap u8", 10)), vec![("rust", "maps")]);
    }

    #[test]
    fn test_heading_match_ranks_first() {
        let index = index_of(&[("a", "# Intro\nrust rust rust\n# Rust\nonce\n")]);
        let results = index.query("rust", 10);
        assert_eq!(results[0].section_id, "rust");
        assert_eq!(results[0].score, 11.0);
        assert_eq!(results[1].score, 3.0);
    }

    #[test]
    fn test_limit_and_empty_answers() {
        let index = index_of(&[("a", "# A\nterm\n# B\nterm\n# C\nterm\n")]);
        assert_eq!(index.query("term", 2).len(), 2);
        assert!(index.query("term", 0).is_empty());
        assert!(index.query("absent", 5).is_empty());
        assert!(index.query("   ", 5).is_empty());
    }

    #[test]
    fn test_rebuild_replaces_index() {
        let mut index = index_of(&[("a", "# A\nalpha\n")]);
        let sections = split_sections("b", "# B\nbeta\n");
        index.build(&sections);
        assert!(index.query("alpha", 5).is_empty());
        assert_eq!(index.query("beta", 5).len(), 1);
        assert_eq!(index.section_count(), 1);
    }

    #[test]
    fn test_positions_reported() {
        let index = index_of(&[("a", "# Topic\nfoo bar foo\n")]);
        let results = index.query("foo", 5);
        // "topic" is token 0
        assert_eq!(results[0].positions, vec![1, 3]);
        assert_eq!(results[0].matched_terms, vec!["foo"]);
    }
}
