mod config;
mod confidence;
mod rules;

pub use config::{BlendMode, EstimatorConfig, PrecedentWeights, RuleBlendWeights};
pub use confidence::ConfidenceTier;
pub use rules::{heuristic_fault, match_rule, StewardRule, RULEBOOK};

use super::corpus::IncidentRecord;
use super::matcher::{MatchResult, PrecedentMatcher};
use super::query::IncidentQuery;
use confidence::{tier_for_matches, tier_with_rule};
use serde::Serialize;

/// Which path produced an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimationMethod {
    HumanOverride,
    Precedent,
    RuleBlend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultSignal {
    ManualOverride,
    PrecedentAverage,
    NeutralBaseline,
    Rulebook,
    IncidentPrior,
}

/// One weighted input to the blended fault, kept for audits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaultComponent {
    pub signal: FaultSignal,
    pub value: f32,
    pub weight: f32,
    pub notes: String,
}

/// Two-party fault split; `fault_a + fault_b == 100`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaultEstimate {
    pub fault_a: u8,
    pub fault_b: u8,
    pub confidence: ConfidenceTier,
    pub method: EstimationMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<&'static StewardRule>,
    pub components: Vec<FaultComponent>,
}

impl FaultEstimate {
    fn split(
        fault_a: u8,
        confidence: ConfidenceTier,
        method: EstimationMethod,
        rule: Option<&'static StewardRule>,
        components: Vec<FaultComponent>,
    ) -> Self {
        let fault_a = fault_a.min(100);
        Self {
            fault_a,
            fault_b: 100 - fault_a,
            confidence,
            method,
            rule,
            components,
        }
    }
}

/// Estimate plus the precedents that informed it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaultAssessment<'a> {
    pub estimate: FaultEstimate,
    pub matches: Vec<MatchResult<'a>>,
}

/// Stateless engine combining precedent matches with static priors.
#[derive(Debug, Clone)]
pub struct FaultEstimator {
    config: EstimatorConfig,
    matcher: PrecedentMatcher,
}

impl Default for FaultEstimator {
    fn default() -> Self {
        Self::new(EstimatorConfig::default())
    }
}

impl FaultEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        let matcher = PrecedentMatcher::new(config.top_k);
        Self { config, matcher }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Ranks the corpus and estimates the split. A manual override skips
    /// matching entirely.
    pub fn assess<'a>(
        &self,
        query: &IncidentQuery,
        records: &'a [IncidentRecord],
    ) -> FaultAssessment<'a> {
        if let Some(fault_a) = query.manual_override_fault {
            return FaultAssessment {
                estimate: override_estimate(fault_a),
                matches: Vec::new(),
            };
        }

        let matches = self.matcher.rank(query, records);
        let estimate = self.estimate(query, &matches);
        FaultAssessment { estimate, matches }
    }

    /// Estimates from an already ranked match set.
    pub fn estimate(&self, query: &IncidentQuery, matches: &[MatchResult<'_>]) -> FaultEstimate {
        if let Some(fault_a) = query.manual_override_fault {
            return override_estimate(fault_a);
        }

        match self.config.mode {
            BlendMode::Precedent => self.precedent_estimate(matches),
            BlendMode::RuleBlend => self.rule_blend_estimate(query, matches),
        }
    }

    fn precedent_estimate(&self, matches: &[MatchResult<'_>]) -> FaultEstimate {
        let weights = self.config.precedent;
        let components = match precedent_average(matches) {
            Some((average, counted)) => vec![
                FaultComponent {
                    signal: FaultSignal::PrecedentAverage,
                    value: average,
                    weight: weights.dataset,
                    notes: format!("average Car A fault across {counted} precedent(s)"),
                },
                FaultComponent {
                    signal: FaultSignal::NeutralBaseline,
                    value: weights.baseline_fault,
                    weight: weights.baseline,
                    notes: "neutral baseline".to_string(),
                },
            ],
            None => vec![FaultComponent {
                signal: FaultSignal::PrecedentAverage,
                value: self.config.no_precedent_fault,
                weight: 1.0,
                notes: "no precedent with a recorded fault, using default".to_string(),
            }],
        };

        FaultEstimate::split(
            self.clamp(weighted_mean(&components)),
            tier_for_matches(matches.len()),
            EstimationMethod::Precedent,
            None,
            components,
        )
    }

    fn rule_blend_estimate(
        &self,
        query: &IncidentQuery,
        matches: &[MatchResult<'_>],
    ) -> FaultEstimate {
        let weights = self.config.rule_blend;
        let neutral = self.config.neutral_fault;

        let dataset = match precedent_average(matches) {
            Some((average, counted)) => FaultComponent {
                signal: FaultSignal::PrecedentAverage,
                value: average,
                weight: weights.dataset,
                notes: format!("average Car A fault across {counted} precedent(s)"),
            },
            None => FaultComponent {
                signal: FaultSignal::PrecedentAverage,
                value: self.config.no_precedent_fault,
                weight: weights.dataset,
                notes: "no precedent with a recorded fault, using default".to_string(),
            },
        };

        let rule = match_rule(&query.rule_text());
        let rulebook = FaultComponent {
            signal: FaultSignal::Rulebook,
            value: rule.map_or(neutral, |rule| rule.fault_a),
            weight: weights.rule,
            notes: rule.map_or_else(|| "no rule matched".to_string(), StewardRule::citation),
        };

        let prior = FaultComponent {
            signal: FaultSignal::IncidentPrior,
            value: query.incident_key.map_or(neutral, heuristic_fault),
            weight: weights.heuristic,
            notes: query.incident_key.map_or_else(
                || "no incident type supplied".to_string(),
                |kind| format!("prior for {}", kind.key()),
            ),
        };

        let components = vec![dataset, rulebook, prior];
        FaultEstimate::split(
            self.clamp(weighted_mean(&components)),
            tier_with_rule(matches.len(), rule.is_some()),
            EstimationMethod::RuleBlend,
            rule,
            components,
        )
    }

    fn clamp(&self, raw: f32) -> u8 {
        let raw = if raw.is_finite() {
            raw
        } else {
            self.config.neutral_fault
        };
        raw.round()
            .clamp(f32::from(self.config.min_fault), f32::from(self.config.max_fault)) as u8
    }
}

fn override_estimate(fault_a: f32) -> FaultEstimate {
    let component = FaultComponent {
        signal: FaultSignal::ManualOverride,
        value: fault_a,
        weight: 1.0,
        notes: "steward override".to_string(),
    };
    FaultEstimate::split(
        fault_a.round().clamp(0.0, 100.0) as u8,
        ConfidenceTier::HumanOverride,
        EstimationMethod::HumanOverride,
        None,
        vec![component],
    )
}

/// Mean of the valid fault values and how many contributed.
fn precedent_average(matches: &[MatchResult<'_>]) -> Option<(f32, usize)> {
    let faults: Vec<f32> = matches
        .iter()
        .filter_map(|m| m.record.fault_pct_driver_a)
        .collect();
    if faults.is_empty() {
        return None;
    }
    Some((faults.iter().sum::<f32>() / faults.len() as f32, faults.len()))
}

fn weighted_mean(components: &[FaultComponent]) -> f32 {
    let total_weight: f32 = components.iter().map(|c| c.weight).sum();
    if total_weight <= 0.0 {
        return f32::NAN;
    }
    components.iter().map(|c| c.value * c.weight).sum::<f32>() / total_weight
}

/// Runs matching and estimation with the default constants for `mode`.
pub fn estimate_fault<'a>(
    query: &IncidentQuery,
    records: &'a [IncidentRecord],
    mode: BlendMode,
) -> FaultAssessment<'a> {
    FaultEstimator::new(EstimatorConfig::with_mode(mode)).assess(query, records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::precedents::IncidentKind;

    fn record(title: &str, fault: Option<f32>) -> IncidentRecord {
        IncidentRecord::new(title, "", "", fault).expect("usable record")
    }

    #[test]
    fn precedent_mode_blends_average_with_baseline() {
        let records = vec![
            record("punt into turn 3", Some(80.0)),
            record("punt at the hairpin", Some(60.0)),
        ];
        let estimator = FaultEstimator::new(EstimatorConfig::with_mode(BlendMode::Precedent));

        let assessment = estimator.assess(&IncidentQuery::new().with_text("punt"), &records);

        // 70 * 0.7 + 50 * 0.3
        assert_eq!(assessment.estimate.fault_a, 64);
        assert_eq!(assessment.estimate.fault_b, 36);
        assert_eq!(assessment.estimate.confidence, ConfidenceTier::Medium);
        assert_eq!(assessment.estimate.method, EstimationMethod::Precedent);
    }

    #[test]
    fn precedent_mode_without_valid_faults_uses_default() {
        let records = vec![record("netcode teleport", None)];
        let estimator = FaultEstimator::new(EstimatorConfig::with_mode(BlendMode::Precedent));

        let assessment = estimator.assess(&IncidentQuery::new().with_text("netcode"), &records);

        assert_eq!(assessment.matches.len(), 1);
        assert_eq!(assessment.estimate.fault_a, 60);
        assert_eq!(assessment.estimate.confidence, ConfidenceTier::Medium);
    }

    #[test]
    fn rule_blend_weighs_three_signals() {
        let records = vec![record("divebomb at turn 1", Some(90.0))];
        let estimator = FaultEstimator::default();
        let query = IncidentQuery::new()
            .with_text("divebomb turn one")
            .with_kind(IncidentKind::Divebomb);

        let assessment = estimator.assess(&query, &records);

        // 90 * 0.4 + 85 * 0.4 + 80 * 0.2
        assert_eq!(assessment.estimate.fault_a, 86);
        assert_eq!(assessment.estimate.method, EstimationMethod::RuleBlend);
        assert_eq!(assessment.estimate.rule.map(|rule| rule.id), Some("2.1"));
        assert_eq!(assessment.estimate.confidence, ConfidenceTier::Medium);
        assert_eq!(assessment.estimate.components.len(), 3);
    }

    #[test]
    fn result_is_clamped_to_band() {
        let records = vec![record("racing incident, nobody to blame", Some(0.0))];
        let config = EstimatorConfig {
            mode: BlendMode::Precedent,
            precedent: PrecedentWeights {
                dataset: 1.0,
                baseline: 0.0,
                baseline_fault: 50.0,
            },
            ..EstimatorConfig::default()
        };
        let query = IncidentQuery::new().with_text("racing");
        let assessment = FaultEstimator::new(config).assess(&query, &records);
        assert_eq!(assessment.estimate.fault_a, 5);
        assert_eq!(assessment.estimate.fault_b, 95);
    }

    #[test]
    fn override_bypasses_matching() {
        let records = vec![record("divebomb at turn 1", Some(90.0))];
        let query = IncidentQuery::new().with_text("divebomb").with_override(15.4);

        let assessment = estimate_fault(&query, &records, BlendMode::RuleBlend);

        assert!(assessment.matches.is_empty());
        assert_eq!(assessment.estimate.fault_a, 15);
        assert_eq!(assessment.estimate.confidence, ConfidenceTier::HumanOverride);
        assert_eq!(assessment.estimate.method, EstimationMethod::HumanOverride);
    }
}
