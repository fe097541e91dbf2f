use super::kind::IncidentKind;
use serde::{Deserialize, Serialize};

/// Caller-supplied description of the incident being judged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncidentQuery {
    #[serde(default)]
    pub free_text: Option<String>,
    #[serde(default)]
    pub incident_key: Option<IncidentKind>,
    /// Steward-entered fault for Car A. Callers validate the `[0, 100]` range.
    #[serde(default)]
    pub manual_override_fault: Option<f32>,
}

impl IncidentQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.free_text = Some(text.into());
        self
    }

    pub fn with_kind(mut self, kind: IncidentKind) -> Self {
        self.incident_key = Some(kind);
        self
    }

    pub fn with_override(mut self, fault_a: f32) -> Self {
        self.manual_override_fault = Some(fault_a);
        self
    }

    /// Lowercased free text plus the incident key, used for rulebook lookup.
    pub(crate) fn rule_text(&self) -> String {
        let mut text = self
            .free_text
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();
        if let Some(kind) = self.incident_key {
            text.push(' ');
            text.push_str(kind.key());
        }
        text
    }
}
