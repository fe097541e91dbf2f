use super::domain::{IncidentContext, SpotterAdvice, Verdict};
use crate::config::NarrativeConfig;
use crate::precedents::{FaultEstimate, MatchResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt::Write as _;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

const MAX_TOKENS: u32 = 700;
const TEMPERATURE: f32 = 0.8;

/// Prompt and sampling settings sent to a narrative provider.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl NarrativeRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        }
    }

    /// The prompt pins the computed split so the model explains it rather
    /// than inventing one.
    pub fn for_incident(
        context: &IncidentContext,
        estimate: &FaultEstimate,
        matches: &[MatchResult<'_>],
    ) -> Self {
        let mut prompt = String::new();
        let _ = writeln!(
            prompt,
            "You are a sim racing steward. Rule on the incident below and reply with JSON only."
        );
        let _ = writeln!(prompt, "Incident: {}", context.incident_label);
        let _ = writeln!(prompt, "Video title: {}", context.video_title);
        if let Some(url) = &context.video_url {
            let _ = writeln!(prompt, "Video: {url}");
        }
        if let Some(series) = &context.series {
            let _ = writeln!(prompt, "Series: {series}");
        }
        if let Some(notes) = &context.steward_notes {
            let _ = writeln!(prompt, "Steward notes: {notes}");
        }
        let _ = writeln!(prompt, "{}", context.car_identification());
        let _ = writeln!(
            prompt,
            "Fault split (fixed): Car A {}%, Car B {}%. Confidence: {}.",
            estimate.fault_a, estimate.fault_b, estimate.confidence
        );
        if let Some(rule) = estimate.rule {
            let _ = writeln!(prompt, "Applicable rule: {}", rule.citation());
        }
        if !matches.is_empty() {
            let _ = writeln!(prompt, "Precedents:");
            for result in matches {
                let record = result.record;
                let _ = writeln!(
                    prompt,
                    "- {} | ruling: {} | reason: {}",
                    record.title, record.ruling, record.reason
                );
            }
        }
        let _ = write!(
            prompt,
            "Return an object with keys rule, car_identification, explanation, overtake_tip, \
             defend_tip and spotter_advice (with overtaker and defender)."
        );
        Self::new(prompt)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NarrativeError {
    #[error("narrative provider unavailable: {0}")]
    Unavailable(String),
    #[error("narrative transport failed: {0}")]
    Transport(String),
    #[error("narrative provider returned status {0}")]
    Status(u16),
    #[error("narrative provider timed out after {0:?}")]
    TimedOut(Duration),
}

impl NarrativeError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status(code) => *code == 429 || (500..600).contains(code),
            Self::Unavailable(_) | Self::TimedOut(_) => false,
        }
    }
}

/// External text-generation backend used to flesh out verdict prose.
#[async_trait]
pub trait NarrativeProvider: Send + Sync {
    async fn complete(&self, request: &NarrativeRequest) -> Result<String, NarrativeError>;
}

/// Provider used when no model backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineNarrator;

#[async_trait]
impl NarrativeProvider for OfflineNarrator {
    async fn complete(&self, _request: &NarrativeRequest) -> Result<String, NarrativeError> {
        Err(NarrativeError::Unavailable(
            "no narrative provider configured".to_string(),
        ))
    }
}

/// Linear backoff for the given retry, saturating instead of overflowing.
pub(crate) fn retry_delay(backoff: Duration, attempt: u32) -> Duration {
    backoff.saturating_mul(attempt)
}

/// Retries retryable failures, sleeping `backoff * attempt` between tries.
pub async fn retry_with_backoff<T, F, Fut>(
    max_attempts: u32,
    backoff: Duration,
    mut operation: F,
) -> Result<T, NarrativeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, NarrativeError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                let delay = retry_delay(backoff, attempt);
                warn!(
                    attempt,
                    max_attempts,
                    backoff_ms = delay.as_millis() as u64,
                    error = %err,
                    "narrative request failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Calls the provider under the configured retry policy and overall deadline.
pub async fn request_narrative<P: NarrativeProvider + ?Sized>(
    provider: &P,
    request: &NarrativeRequest,
    policy: &NarrativeConfig,
) -> Result<String, NarrativeError> {
    let attempts = retry_with_backoff(policy.max_attempts, policy.backoff, || {
        provider.complete(request)
    });
    match tokio::time::timeout(policy.timeout, attempts).await {
        Ok(result) => result,
        Err(_) => Err(NarrativeError::TimedOut(policy.timeout)),
    }
}

/// Strips a surrounding markdown code fence from a model response.
pub fn strip_code_blocks(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
enum SpotterPatch {
    Split {
        #[serde(default)]
        overtaker: Option<String>,
        #[serde(default)]
        defender: Option<String>,
    },
    Shared(String),
}

/// Fields a model may rewrite. Fault and confidence are never taken from
/// the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VerdictPatch {
    #[serde(default)]
    rule: Option<String>,
    #[serde(default, alias = "carIdentification")]
    car_identification: Option<String>,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default, alias = "overtakeTip")]
    overtake_tip: Option<String>,
    #[serde(default, alias = "defendTip")]
    defend_tip: Option<String>,
    #[serde(default, alias = "spotterAdvice")]
    spotter_advice: Option<SpotterPatch>,
}

impl VerdictPatch {
    /// Parses a model response, tolerating a markdown fence around the JSON.
    pub fn parse(response: &str) -> Option<Self> {
        serde_json::from_str(strip_code_blocks(response)).ok()
    }

    /// Overwrites verdict fields with every non-blank patched value.
    pub fn apply(self, verdict: &mut Verdict) {
        replace(&mut verdict.rule, self.rule);
        replace(&mut verdict.car_identification, self.car_identification);
        replace(&mut verdict.explanation, self.explanation);
        replace(&mut verdict.overtake_tip, self.overtake_tip);
        replace(&mut verdict.defend_tip, self.defend_tip);

        let SpotterAdvice {
            overtaker,
            defender,
        } = &mut verdict.spotter_advice;
        match self.spotter_advice {
            Some(SpotterPatch::Split {
                overtaker: new_overtaker,
                defender: new_defender,
            }) => {
                replace(overtaker, new_overtaker);
                replace(defender, new_defender);
            }
            Some(SpotterPatch::Shared(advice)) => {
                replace(overtaker, Some(advice.clone()));
                replace(defender, Some(advice));
            }
            None => {}
        }
    }
}

fn replace(slot: &mut String, value: Option<String>) {
    if let Some(value) = value.filter(|value| !value.trim().is_empty()) {
        *slot = value;
    }
}
