use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical category of a racing incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentKind {
    #[serde(rename = "divebomb")]
    Divebomb,
    #[serde(rename = "weave block")]
    WeaveBlock,
    #[serde(rename = "unsafe rejoin")]
    UnsafeRejoin,
    #[serde(rename = "vortex exit")]
    VortexExit,
    #[serde(rename = "netcode")]
    Netcode,
    #[serde(rename = "used as barrier")]
    UsedAsBarrier,
    #[serde(rename = "pit-lane incident")]
    PitLane,
    #[serde(rename = "t1 chaos")]
    StartChaos,
    #[serde(rename = "intentional wreck")]
    IntentionalWreck,
    #[serde(rename = "racing incident")]
    RacingIncident,
    #[serde(rename = "punt")]
    Punt,
    #[serde(rename = "brake test")]
    BrakeTest,
    #[serde(rename = "blue flag")]
    BlueFlag,
    #[serde(rename = "track limits")]
    TrackLimits,
    #[serde(rename = "general contact")]
    GeneralContact,
}

/// Labels offered by the intake form, mapped to their canonical kind.
const FORM_LABELS: &[(&str, IncidentKind)] = &[
    ("divebomb / late lunge", IncidentKind::Divebomb),
    ("weave / block / defending move", IncidentKind::WeaveBlock),
    ("over-aggressive defense (2+ moves)", IncidentKind::WeaveBlock),
    ("move under braking", IncidentKind::WeaveBlock),
    ("unsafe rejoin", IncidentKind::UnsafeRejoin),
    ("track rejoin blocking racing line", IncidentKind::UnsafeRejoin),
    ("re-entry after off-track (gaining advantage)", IncidentKind::UnsafeRejoin),
    ("vortex exit / draft lift-off", IncidentKind::VortexExit),
    ("vortex of danger", IncidentKind::VortexExit),
    ("netcode / lag / teleport", IncidentKind::Netcode),
    ("used as a barrier / squeeze", IncidentKind::UsedAsBarrier),
    ("pit-lane incident", IncidentKind::PitLane),
    ("pit lane speeding / unsafe release", IncidentKind::PitLane),
    ("start-line chaos / t1 pile-up", IncidentKind::StartChaos),
    ("crowd-strike / accordion effect", IncidentKind::StartChaos),
    ("intentional wreck / revenge", IncidentKind::IntentionalWreck),
    ("racing incident (no fault)", IncidentKind::RacingIncident),
    ("side-by-side contact mid-corner", IncidentKind::RacingIncident),
    ("punt / rear-end under braking", IncidentKind::Punt),
    ("brake test", IncidentKind::BrakeTest),
    ("brake check", IncidentKind::BrakeTest),
    ("blocking while being lapped", IncidentKind::BlueFlag),
    ("blue-flag violation / ignoring blue flags", IncidentKind::BlueFlag),
    ("cutting the track / track limits abuse", IncidentKind::TrackLimits),
    ("track limits abuse in monaco / tight corners", IncidentKind::TrackLimits),
];

/// Title keywords in priority order; the first hit decides the kind.
const TITLE_KEYWORDS: &[(&str, IncidentKind)] = &[
    ("intentional", IncidentKind::IntentionalWreck),
    ("revenge", IncidentKind::IntentionalWreck),
    ("unsafe rejoin", IncidentKind::UnsafeRejoin),
    ("rejoin", IncidentKind::UnsafeRejoin),
    ("divebomb", IncidentKind::Divebomb),
    ("dive bomb", IncidentKind::Divebomb),
    ("lunge", IncidentKind::Divebomb),
    ("brake check", IncidentKind::BrakeTest),
    ("brake test", IncidentKind::BrakeTest),
    ("punting", IncidentKind::Punt),
    ("punt", IncidentKind::Punt),
    ("rear-end", IncidentKind::Punt),
    ("netcode", IncidentKind::Netcode),
    ("teleport", IncidentKind::Netcode),
    ("lag", IncidentKind::Netcode),
    ("weave", IncidentKind::WeaveBlock),
    ("blocking", IncidentKind::WeaveBlock),
    ("squeeze", IncidentKind::UsedAsBarrier),
    ("barrier", IncidentKind::UsedAsBarrier),
    ("vortex", IncidentKind::VortexExit),
    ("blue flag", IncidentKind::BlueFlag),
    ("track limits", IncidentKind::TrackLimits),
    ("pit lane", IncidentKind::PitLane),
    ("pit-lane", IncidentKind::PitLane),
    ("pile-up", IncidentKind::StartChaos),
    ("t1", IncidentKind::StartChaos),
    ("racing incident", IncidentKind::RacingIncident),
];

impl IncidentKind {
    pub const fn ordered() -> [Self; 15] {
        [
            Self::Divebomb,
            Self::WeaveBlock,
            Self::UnsafeRejoin,
            Self::VortexExit,
            Self::Netcode,
            Self::UsedAsBarrier,
            Self::PitLane,
            Self::StartChaos,
            Self::IntentionalWreck,
            Self::RacingIncident,
            Self::Punt,
            Self::BrakeTest,
            Self::BlueFlag,
            Self::TrackLimits,
            Self::GeneralContact,
        ]
    }

    /// Canonical lowercase tag used for corpus matching.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Divebomb => "divebomb",
            Self::WeaveBlock => "weave block",
            Self::UnsafeRejoin => "unsafe rejoin",
            Self::VortexExit => "vortex exit",
            Self::Netcode => "netcode",
            Self::UsedAsBarrier => "used as barrier",
            Self::PitLane => "pit-lane incident",
            Self::StartChaos => "t1 chaos",
            Self::IntentionalWreck => "intentional wreck",
            Self::RacingIncident => "racing incident",
            Self::Punt => "punt",
            Self::BrakeTest => "brake test",
            Self::BlueFlag => "blue flag",
            Self::TrackLimits => "track limits",
            Self::GeneralContact => "general contact",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Divebomb => "Divebomb / Late lunge",
            Self::WeaveBlock => "Weave / Block / Defending move",
            Self::UnsafeRejoin => "Unsafe rejoin",
            Self::VortexExit => "Vortex exit / Draft lift-off",
            Self::Netcode => "Netcode / Lag / Teleport",
            Self::UsedAsBarrier => "Used as a barrier / Squeeze",
            Self::PitLane => "Pit-lane incident",
            Self::StartChaos => "Start-line chaos / T1 pile-up",
            Self::IntentionalWreck => "Intentional wreck / Revenge",
            Self::RacingIncident => "Racing incident (no fault)",
            Self::Punt => "Punt / Rear-end under braking",
            Self::BrakeTest => "Brake test",
            Self::BlueFlag => "Blue-flag violation / Ignoring blue flags",
            Self::TrackLimits => "Cutting the track / Track limits abuse",
            Self::GeneralContact => "General contact",
        }
    }

    /// Role descriptions for Car A and Car B in verdict text.
    pub const fn car_roles(self) -> (&'static str, &'static str) {
        match self {
            Self::WeaveBlock => ("the defending car", "the overtaking car"),
            Self::UnsafeRejoin => ("the rejoining car", "the on-track car"),
            Self::Netcode => ("the teleporting car", "the affected car"),
            Self::UsedAsBarrier => (
                "the car using another as a barrier",
                "the car used as a barrier",
            ),
            Self::IntentionalWreck => ("the aggressor", "the victim"),
            Self::Punt => ("the following car", "the car ahead"),
            Self::BrakeTest => ("the braking car", "the following car"),
            Self::BlueFlag => ("the car being lapped", "the lapping car"),
            Self::RacingIncident => ("Car A", "Car B"),
            _ => ("the overtaking car", "the defending car"),
        }
    }

    /// Resolves a form selection or canonical key. Unknown non-empty
    /// selections fall back to [`IncidentKind::GeneralContact`].
    pub fn resolve(selection: &str) -> Option<Self> {
        let trimmed = selection.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(trimmed.parse().unwrap_or(Self::GeneralContact))
    }

    /// Derives a kind from a free-text title using the keyword table.
    pub fn from_title(title: &str) -> Option<Self> {
        let lower = title.to_lowercase();
        TITLE_KEYWORDS
            .iter()
            .find(|(keyword, _)| contains_word(&lower, keyword))
            .map(|(_, kind)| *kind)
    }
}

/// Substring match that refuses hits glued to alphanumerics on either side,
/// so "lag" does not fire on "flag".
pub(crate) fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

impl fmt::Display for IncidentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown incident kind '{0}'")]
pub struct UnknownIncidentKind(pub String);

impl FromStr for IncidentKind {
    type Err = UnknownIncidentKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lower = value.trim().to_lowercase();
        if let Some(kind) = Self::ordered().into_iter().find(|kind| kind.key() == lower) {
            return Ok(kind);
        }
        if let Some(kind) = Self::ordered()
            .into_iter()
            .find(|kind| kind.label().to_lowercase() == lower)
        {
            return Ok(kind);
        }
        FORM_LABELS
            .iter()
            .find(|(label, _)| *label == lower)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| UnknownIncidentKind(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_form_labels_and_keys() {
        assert_eq!(
            IncidentKind::resolve("Divebomb / Late lunge"),
            Some(IncidentKind::Divebomb)
        );
        assert_eq!(
            IncidentKind::resolve("unsafe rejoin"),
            Some(IncidentKind::UnsafeRejoin)
        );
        assert_eq!(
            IncidentKind::resolve("Brake check"),
            Some(IncidentKind::BrakeTest)
        );
        assert_eq!(
            IncidentKind::resolve("Three-Wide / Four-Wide Incident"),
            Some(IncidentKind::GeneralContact)
        );
        assert_eq!(IncidentKind::resolve("   "), None);
    }

    #[test]
    fn derives_kind_from_title_keywords() {
        assert_eq!(
            IncidentKind::from_title("Huge DIVEBOMB at Spa T1"),
            Some(IncidentKind::Divebomb)
        );
        assert_eq!(
            IncidentKind::from_title("Unsafe rejoin after a spin"),
            Some(IncidentKind::UnsafeRejoin)
        );
        assert_eq!(
            IncidentKind::from_title("Ignored the blue flag for two laps"),
            Some(IncidentKind::BlueFlag)
        );
        assert_eq!(IncidentKind::from_title("Quiet lap at Monza"), None);
    }

    #[test]
    fn keys_round_trip_through_parse() {
        for kind in IncidentKind::ordered() {
            assert_eq!(kind.key().parse::<IncidentKind>(), Ok(kind));
        }
    }

    #[test]
    fn serde_uses_canonical_key() {
        let json = serde_json::to_string(&IncidentKind::UsedAsBarrier).expect("serializes");
        assert_eq!(json, "\"used as barrier\"");
    }
}
