use crate::precedents::kind::{contains_word, IncidentKind};
use serde::Serialize;

/// A rulebook entry with the Car A fault it implies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StewardRule {
    pub id: &'static str,
    pub source: &'static str,
    pub title: &'static str,
    #[serde(skip)]
    pub keywords: &'static [&'static str],
    pub fault_a: f32,
}

impl StewardRule {
    pub fn citation(&self) -> String {
        format!("{} ({} Rule {})", self.title, self.source, self.id)
    }
}

/// Checked top to bottom; the first rule with any keyword present wins.
pub const RULEBOOK: &[StewardRule] = &[
    StewardRule {
        id: "1.1",
        source: "Sporting Code",
        title: "Intentional contact",
        keywords: &["intentional wreck", "intentional", "revenge", "wrecked on purpose"],
        fault_a: 95.0,
    },
    StewardRule {
        id: "3.4",
        source: "Racing Standards",
        title: "Safe rejoin after leaving the circuit",
        keywords: &["unsafe rejoin", "rejoin", "re-entry"],
        fault_a: 90.0,
    },
    StewardRule {
        id: "2.3",
        source: "Racing Standards",
        title: "Responsibility of the following car",
        keywords: &["punt", "rear-end", "rear end", "punting"],
        fault_a: 90.0,
    },
    StewardRule {
        id: "2.1",
        source: "Racing Standards",
        title: "Overtaking under braking",
        keywords: &["divebomb", "dive bomb", "lunge", "late dive"],
        fault_a: 85.0,
    },
    StewardRule {
        id: "2.6",
        source: "Racing Standards",
        title: "Unnecessary braking",
        keywords: &["brake test", "brake check", "brake-check"],
        fault_a: 85.0,
    },
    StewardRule {
        id: "4.2",
        source: "Sporting Code",
        title: "Blue flags",
        keywords: &["blue flag", "being lapped"],
        fault_a: 75.0,
    },
    StewardRule {
        id: "2.4",
        source: "Racing Standards",
        title: "Defending position",
        keywords: &["weave block", "weave", "blocking", "block", "two moves", "2+ moves"],
        fault_a: 75.0,
    },
    StewardRule {
        id: "2.5",
        source: "Racing Standards",
        title: "Leaving racing room",
        keywords: &["used as barrier", "squeeze", "barrier"],
        fault_a: 70.0,
    },
    StewardRule {
        id: "5.1",
        source: "Sporting Code",
        title: "Connection quality",
        keywords: &["netcode", "teleport", "lag"],
        fault_a: 50.0,
    },
    StewardRule {
        id: "1.4",
        source: "Sporting Code",
        title: "Racing incidents",
        keywords: &["racing incident", "no fault"],
        fault_a: 50.0,
    },
];

pub fn match_rule(text: &str) -> Option<&'static StewardRule> {
    let lower = text.to_lowercase();
    RULEBOOK
        .iter()
        .find(|rule| {
            rule.keywords
                .iter()
                .any(|keyword| contains_word(&lower, keyword))
        })
}

/// Static Car A fault prior for each incident type.
pub const fn heuristic_fault(kind: IncidentKind) -> f32 {
    match kind {
        IncidentKind::Divebomb => 80.0,
        IncidentKind::WeaveBlock => 70.0,
        IncidentKind::UnsafeRejoin => 85.0,
        IncidentKind::VortexExit => 65.0,
        IncidentKind::Netcode => 50.0,
        IncidentKind::UsedAsBarrier => 70.0,
        IncidentKind::PitLane => 60.0,
        IncidentKind::StartChaos => 55.0,
        IncidentKind::IntentionalWreck => 95.0,
        IncidentKind::RacingIncident => 50.0,
        IncidentKind::Punt => 85.0,
        IncidentKind::BrakeTest => 80.0,
        IncidentKind::BlueFlag => 70.0,
        IncidentKind::TrackLimits => 65.0,
        IncidentKind::GeneralContact => 60.0,
    }
}
