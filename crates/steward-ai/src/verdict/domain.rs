use crate::precedents::{
    ConfidenceTier, FaultEstimate, IncidentKind, IncidentQuery, MatchResult,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const DEFAULT_VIDEO_TITLE: &str = "Sim racing incident";
const DEFAULT_RULE: &str = "iRacing Sporting Code / ACC Regulations";

/// Incoming verdict request, as posted by the intake form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerdictRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, alias = "incidentType")]
    pub incident_type: Option<String>,
    #[serde(default, alias = "stewardNotes", alias = "description")]
    pub steward_notes: Option<String>,
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default, alias = "carA")]
    pub car_a: Option<String>,
    #[serde(default, alias = "carB")]
    pub car_b: Option<String>,
    #[serde(default, alias = "videoTitle")]
    pub video_title: Option<String>,
    #[serde(default, alias = "manualFault")]
    pub manual_fault: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VerdictRequestError {
    #[error("invalid YouTube URL '{0}'")]
    InvalidVideoUrl(String),
    #[error("manual fault must be between 0 and 100, got {0}")]
    OverrideOutOfRange(f32),
}

/// Validated request with the resolved incident kind and engine query.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentContext {
    pub kind: Option<IncidentKind>,
    pub incident_label: String,
    pub video_url: Option<String>,
    pub video_id: Option<String>,
    pub video_title: String,
    pub steward_notes: Option<String>,
    pub series: Option<String>,
    pub car_a: Option<String>,
    pub car_b: Option<String>,
    pub query: IncidentQuery,
}

impl VerdictRequest {
    pub fn into_context(self) -> Result<IncidentContext, VerdictRequestError> {
        let url = non_empty(self.url);
        let video_id = match url.as_deref() {
            Some(raw) if is_youtube_url(raw) => youtube_video_id(raw).map(str::to_string),
            Some(raw) => return Err(VerdictRequestError::InvalidVideoUrl(raw.to_string())),
            None => None,
        };

        if let Some(fault) = self.manual_fault {
            if !(0.0..=100.0).contains(&fault) {
                return Err(VerdictRequestError::OverrideOutOfRange(fault));
            }
        }

        let incident_type = non_empty(self.incident_type);
        let steward_notes = non_empty(self.steward_notes);
        let title = non_empty(self.video_title);

        let kind = incident_type
            .as_deref()
            .and_then(IncidentKind::resolve)
            .or_else(|| title.as_deref().and_then(IncidentKind::from_title))
            .or_else(|| steward_notes.as_deref().and_then(IncidentKind::from_title));

        let incident_label = incident_type
            .or_else(|| kind.map(|kind| kind.label().to_string()))
            .unwrap_or_else(|| DEFAULT_VIDEO_TITLE.to_string());

        let query = IncidentQuery {
            free_text: steward_notes.clone().or_else(|| title.clone()),
            incident_key: kind,
            manual_override_fault: self.manual_fault,
        };

        Ok(IncidentContext {
            kind,
            incident_label,
            video_url: url,
            video_id,
            video_title: title.unwrap_or_else(|| DEFAULT_VIDEO_TITLE.to_string()),
            steward_notes,
            series: non_empty(self.series),
            car_a: non_empty(self.car_a),
            car_b: non_empty(self.car_b),
            query,
        })
    }
}

impl IncidentContext {
    pub fn car_roles(&self) -> (&'static str, &'static str) {
        self.kind
            .unwrap_or(IncidentKind::GeneralContact)
            .car_roles()
    }

    /// `Car A (Red Porsche #24) is the overtaking car. Car B is ...`
    pub fn car_identification(&self) -> String {
        let (role_a, role_b) = self.car_roles();
        format!(
            "Car A{} is {role_a}. Car B{} is {role_b}.",
            car_suffix(self.car_a.as_deref()),
            car_suffix(self.car_b.as_deref())
        )
    }

    pub(crate) fn car_a_name(&self) -> String {
        format!("Car A{}", car_suffix(self.car_a.as_deref()))
    }

    pub(crate) fn car_b_name(&self) -> String {
        format!("Car B{}", car_suffix(self.car_b.as_deref()))
    }
}

fn car_suffix(identifier: Option<&str>) -> String {
    identifier
        .map(|value| format!(" ({value})"))
        .unwrap_or_default()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

pub fn is_youtube_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.contains("youtube.com") || lower.contains("youtu.be")
}

/// Extracts the 11-character video id from `watch?v=` or `youtu.be/` links.
pub fn youtube_video_id(url: &str) -> Option<&str> {
    let tail = url
        .split_once("v=")
        .or_else(|| url.split_once("youtu.be/"))
        .map(|(_, tail)| tail)?;
    let id = tail.get(..11)?;
    id.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        .then_some(id)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultSplitView {
    #[serde(rename = "Car A")]
    pub car_a: String,
    #[serde(rename = "Car B")]
    pub car_b: String,
}

impl From<&FaultEstimate> for FaultSplitView {
    fn from(estimate: &FaultEstimate) -> Self {
        Self {
            car_a: format!("{}%", estimate.fault_a),
            car_b: format!("{}%", estimate.fault_b),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotterAdvice {
    pub overtaker: String,
    pub defender: String,
}

/// Human-readable ruling returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub rule: String,
    pub fault: FaultSplitView,
    pub car_identification: String,
    pub explanation: String,
    pub overtake_tip: String,
    pub defend_tip: String,
    pub spotter_advice: SpotterAdvice,
    pub confidence: ConfidenceTier,
    pub pro_tip: String,
    pub video_title: String,
}

impl Verdict {
    /// Deterministic verdict used whenever the narrative provider fails.
    pub fn canned(context: &IncidentContext, estimate: &FaultEstimate, pro_tip: &str) -> Self {
        let (role_a, role_b) = context.car_roles();
        let car_a = context.car_a_name();
        let car_b = context.car_b_name();

        let mut explanation = format!(
            "In this {}, contact occurred between {car_a} and {car_b}. ",
            context.incident_label.to_lowercase()
        );
        if estimate.fault_a >= 70 {
            explanation.push_str(&format!(
                "{car_a}, as {role_a}, carries the larger share of responsibility for the contact."
            ));
        } else if estimate.fault_b >= 70 {
            explanation.push_str(&format!(
                "{car_b}, as {role_b}, carries the larger share of responsibility for the contact."
            ));
        } else {
            explanation.push_str("Both drivers share responsibility for the contact.");
        }

        Self {
            rule: estimate
                .rule
                .map(|rule| rule.citation())
                .unwrap_or_else(|| DEFAULT_RULE.to_string()),
            fault: FaultSplitView::from(estimate),
            car_identification: context.car_identification(),
            explanation,
            overtake_tip: "Establish overlap before committing.".to_string(),
            defend_tip: "Hold your line predictably.".to_string(),
            spotter_advice: SpotterAdvice {
                overtaker: "Wait for clear overlap.".to_string(),
                defender: "Don't overreact.".to_string(),
            },
            confidence: estimate.confidence,
            pro_tip: pro_tip.to_string(),
            video_title: context.video_title.clone(),
        }
    }
}

/// Precedent as cited back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrecedentView {
    pub title: String,
    pub ruling: String,
    pub reason: String,
    pub fault_a: Option<f32>,
    pub score: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread: Option<String>,
}

impl From<&MatchResult<'_>> for PrecedentView {
    fn from(result: &MatchResult<'_>) -> Self {
        Self {
            title: result.record.title.clone(),
            ruling: result.record.ruling.clone(),
            reason: result.record.reason.clone(),
            fault_a: result.record.fault_pct_driver_a,
            score: result.score,
            thread: result.record.thread.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeSource {
    Model,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerdictResponse {
    pub verdict: Verdict,
    pub precedents: Vec<PrecedentView>,
    pub estimate: FaultEstimate,
    pub narrative_source: NarrativeSource,
    pub assessed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaultEstimateResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_kind: Option<IncidentKind>,
    pub estimate: FaultEstimate,
    pub precedents: Vec<PrecedentView>,
    pub assessed_at: DateTime<Utc>,
}
