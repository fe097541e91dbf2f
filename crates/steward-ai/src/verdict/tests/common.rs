use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::config::NarrativeConfig;
use crate::precedents::{BlendMode, EstimatorConfig, IncidentCorpus, IncidentRecord};
use crate::verdict::{
    NarrativeError, NarrativeProvider, NarrativeRequest, TipBook, VerdictRequest, VerdictService,
};

pub(super) const ONLY_TIP: &str = "Brake in a straight line before turning in.";

pub(super) fn corpus() -> IncidentCorpus {
    let rows = [
        (
            "Divebomb into turn 1 at Spa",
            "Late lunge from too far back",
            "Car A at fault",
            Some(80.0),
        ),
        (
            "Late divebomb at the hairpin",
            "Car A never had overlap",
            "Car A at fault",
            Some(90.0),
        ),
        (
            "Netcode teleport on the straight",
            "Lag spike",
            "Racing incident",
            None,
        ),
        (
            "Brake check on the back straight",
            "Car A slowed mid-straight",
            "Car A at fault",
            Some(85.0),
        ),
    ];
    IncidentCorpus::from_records(
        rows.into_iter()
            .map(|(title, reason, ruling, fault)| {
                IncidentRecord::new(title, reason, ruling, fault).expect("usable record")
            })
            .collect(),
    )
}

pub(super) fn tips() -> TipBook {
    TipBook::from_text(&format!("{ONLY_TIP} | divebomb, braking\n"))
}

pub(super) fn fast_policy() -> NarrativeConfig {
    NarrativeConfig {
        timeout: Duration::from_millis(500),
        max_attempts: 3,
        backoff: Duration::from_millis(1),
    }
}

pub(super) fn build_service<P: NarrativeProvider>(
    narrator: Arc<P>,
    policy: NarrativeConfig,
) -> VerdictService<P> {
    VerdictService::new(
        Arc::new(corpus()),
        Arc::new(tips()),
        narrator,
        EstimatorConfig::with_mode(BlendMode::RuleBlend),
        policy,
    )
}

/// Three precedents match; rule 2.1 applies; rule-blend split is 84/16.
pub(super) fn divebomb_request() -> VerdictRequest {
    VerdictRequest {
        url: Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string()),
        incident_type: Some("Divebomb / Late lunge".to_string()),
        steward_notes: Some("Car A divebombed into turn one".to_string()),
        series: Some("GT3 Sprint".to_string()),
        car_a: Some("Red Porsche #24".to_string()),
        car_b: Some("Blue BMW #7".to_string()),
        video_title: Some("Divebomb at Spa".to_string()),
        manual_fault: None,
    }
}

/// Replays a fixed list of provider outcomes, one per call.
#[derive(Default)]
pub(super) struct ScriptedNarrator {
    responses: Mutex<VecDeque<Result<String, NarrativeError>>>,
    calls: AtomicU32,
    last_prompt: Mutex<Option<String>>,
}

impl ScriptedNarrator {
    pub(super) fn new(responses: impl IntoIterator<Item = Result<String, NarrativeError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            ..Self::default()
        }
    }

    pub(super) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub(super) fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().expect("prompt mutex poisoned").clone()
    }
}

#[async_trait]
impl NarrativeProvider for ScriptedNarrator {
    async fn complete(&self, request: &NarrativeRequest) -> Result<String, NarrativeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().expect("prompt mutex poisoned") = Some(request.prompt.clone());
        self.responses
            .lock()
            .expect("script mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(NarrativeError::Unavailable("script exhausted".to_string())))
    }
}

/// Never answers within any reasonable deadline.
pub(super) struct SlowNarrator;

#[async_trait]
impl NarrativeProvider for SlowNarrator {
    async fn complete(&self, _request: &NarrativeRequest) -> Result<String, NarrativeError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok("{}".to_string())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&bytes).expect("json body")
}
