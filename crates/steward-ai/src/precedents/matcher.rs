use super::corpus::IncidentRecord;
use super::query::IncidentQuery;
use super::scorer::{query_terms, LexicalScorer};
use serde::Serialize;

pub const DEFAULT_TOP_K: usize = 5;

/// A corpus record paired with its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult<'a> {
    pub record: &'a IncidentRecord,
    pub score: u32,
}

/// Linear-scan ranker over the precedent corpus.
#[derive(Debug, Clone)]
pub struct PrecedentMatcher {
    scorer: LexicalScorer,
    top_k: usize,
}

impl Default for PrecedentMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_K)
    }
}

impl PrecedentMatcher {
    /// Panics when `top_k` is zero.
    pub fn new(top_k: usize) -> Self {
        Self::with_scorer(LexicalScorer::default(), top_k)
    }

    pub fn with_scorer(scorer: LexicalScorer, top_k: usize) -> Self {
        assert!(top_k > 0, "precedent matcher requires top_k >= 1");
        Self { scorer, top_k }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Returns at most `top_k` records with a positive score, best first.
    /// Equal scores keep corpus order.
    pub fn rank<'a>(
        &self,
        query: &IncidentQuery,
        records: &'a [IncidentRecord],
    ) -> Vec<MatchResult<'a>> {
        let terms = query
            .free_text
            .as_deref()
            .map(query_terms)
            .unwrap_or_default();
        if terms.is_empty() && query.incident_key.is_none() {
            return Vec::new();
        }

        let mut matches: Vec<MatchResult<'a>> = records
            .iter()
            .filter_map(|record| {
                let score = self
                    .scorer
                    .score(&terms, record.searchable_text(), query.incident_key);
                (score > 0).then_some(MatchResult { record, score })
            })
            .collect();

        matches.sort_by(|left, right| right.score.cmp(&left.score));
        matches.truncate(self.top_k);
        matches
    }
}
