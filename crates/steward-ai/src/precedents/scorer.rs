use super::kind::IncidentKind;

/// Points awarded per query term found in a record.
pub const TERM_HIT_WEIGHT: u32 = 3;
/// Points awarded when the incident key or its label appears in a record.
pub const INCIDENT_KEY_BONUS: u32 = 10;

/// Splits free text into lowercase match terms, dropping tokens of two
/// characters or fewer and repeated terms.
pub fn query_terms(text: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for raw in text.split_whitespace() {
        let token = raw
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if token.chars().count() <= 2 || terms.contains(&token) {
            continue;
        }
        terms.push(token);
    }
    terms
}

/// Substring-overlap relevance scorer. Scores are unnormalized, so longer
/// records are never penalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexicalScorer {
    pub term_weight: u32,
    pub key_bonus: u32,
}

impl Default for LexicalScorer {
    fn default() -> Self {
        Self {
            term_weight: TERM_HIT_WEIGHT,
            key_bonus: INCIDENT_KEY_BONUS,
        }
    }
}

impl LexicalScorer {
    /// `candidate_text` must already be lowercased.
    pub fn score(
        &self,
        terms: &[String],
        candidate_text: &str,
        incident_key: Option<IncidentKind>,
    ) -> u32 {
        let term_hits = terms
            .iter()
            .filter(|term| candidate_text.contains(term.as_str()))
            .count() as u32;

        let key_hit = incident_key.is_some_and(|kind| {
            candidate_text.contains(kind.key())
                || candidate_text.contains(kind.label().to_lowercase().as_str())
        });

        let mut score = term_hits.saturating_mul(self.term_weight);
        if key_hit {
            score = score.saturating_add(self.key_bonus);
        }
        score
    }
}
