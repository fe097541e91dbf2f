use crate::precedents::matcher::DEFAULT_TOP_K;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Blending strategy used when no manual override is supplied. One
/// deployment uses exactly one mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Precedent average mixed with a neutral baseline.
    Precedent,
    /// Precedent average, rulebook value and incident-type prior.
    RuleBlend,
}

impl FromStr for BlendMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "precedent" | "precedents" => Ok(Self::Precedent),
            "rule" | "rules" | "rule_blend" | "rule-blend" => Ok(Self::RuleBlend),
            other => Err(format!("unknown blend mode '{other}'")),
        }
    }
}

/// Weights for [`BlendMode::Precedent`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrecedentWeights {
    pub dataset: f32,
    pub baseline: f32,
    pub baseline_fault: f32,
}

/// Weights for [`BlendMode::RuleBlend`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleBlendWeights {
    pub dataset: f32,
    pub rule: f32,
    pub heuristic: f32,
}

/// Constants governing fault estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatorConfig {
    pub mode: BlendMode,
    pub top_k: usize,
    pub precedent: PrecedentWeights,
    pub rule_blend: RuleBlendWeights,
    /// Stand-in for a missing rule or heuristic signal.
    pub neutral_fault: f32,
    /// Used when no matched precedent carries a valid fault value.
    pub no_precedent_fault: f32,
    pub min_fault: u8,
    pub max_fault: u8,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            mode: BlendMode::RuleBlend,
            top_k: DEFAULT_TOP_K,
            precedent: PrecedentWeights {
                dataset: 0.7,
                baseline: 0.3,
                baseline_fault: 50.0,
            },
            rule_blend: RuleBlendWeights {
                dataset: 0.4,
                rule: 0.4,
                heuristic: 0.2,
            },
            neutral_fault: 50.0,
            no_precedent_fault: 60.0,
            min_fault: 5,
            max_fault: 98,
        }
    }
}

impl EstimatorConfig {
    pub fn with_mode(mode: BlendMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }
}
