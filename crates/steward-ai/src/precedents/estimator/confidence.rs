use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordinal indicator of how much evidence backs an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConfidenceTier {
    Low,
    Medium,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
    #[serde(rename = "Human Override")]
    HumanOverride,
}

impl ConfidenceTier {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::VeryHigh => "Very High",
            Self::HumanOverride => "Human Override",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 0 → Low, 1-2 → Medium, 3 → High, 4+ → Very High.
pub(crate) fn tier_for_matches(match_count: usize) -> ConfidenceTier {
    match match_count {
        0 => ConfidenceTier::Low,
        1 | 2 => ConfidenceTier::Medium,
        3 => ConfidenceTier::High,
        _ => ConfidenceTier::VeryHigh,
    }
}

/// A rulebook hit lifts Low to Medium. High still needs three matches.
pub(crate) fn tier_with_rule(match_count: usize, rule_matched: bool) -> ConfidenceTier {
    match tier_for_matches(match_count) {
        ConfidenceTier::Low if rule_matched => ConfidenceTier::Medium,
        base => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ladder_steps_with_match_count() {
        let tiers: Vec<ConfidenceTier> = (0..6).map(tier_for_matches).collect();
        assert_eq!(
            tiers,
            vec![
                ConfidenceTier::Low,
                ConfidenceTier::Medium,
                ConfidenceTier::Medium,
                ConfidenceTier::High,
                ConfidenceTier::VeryHigh,
                ConfidenceTier::VeryHigh,
            ]
        );
    }

    #[test]
    fn rule_match_alone_never_reaches_high() {
        assert_eq!(tier_with_rule(0, true), ConfidenceTier::Medium);
        assert_eq!(tier_with_rule(1, true), ConfidenceTier::Medium);
        assert_eq!(tier_with_rule(2, true), ConfidenceTier::Medium);
        assert_eq!(tier_with_rule(3, true), ConfidenceTier::High);
        assert_eq!(tier_with_rule(4, true), ConfidenceTier::VeryHigh);
        assert_eq!(tier_with_rule(0, false), ConfidenceTier::Low);
        assert_eq!(tier_with_rule(1, false), ConfidenceTier::Medium);
    }

    #[test]
    fn serializes_display_labels() {
        let json = serde_json::to_string(&ConfidenceTier::HumanOverride).expect("serializes");
        assert_eq!(json, "\"Human Override\"");
    }
}
