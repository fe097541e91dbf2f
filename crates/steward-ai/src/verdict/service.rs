use super::domain::{
    FaultEstimateResponse, IncidentContext, NarrativeSource, PrecedentView, Verdict,
    VerdictRequest, VerdictRequestError, VerdictResponse,
};
use super::narrative::{
    request_narrative, NarrativeError, NarrativeProvider, NarrativeRequest, VerdictPatch,
};
use super::tips::TipBook;
use crate::config::NarrativeConfig;
use crate::precedents::{EstimatorConfig, FaultAssessment, FaultEstimator, IncidentCorpus};
use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Turns verdict requests into rulings: estimate the fault split, pick a
/// coaching tip, then let the narrative provider rewrite the prose.
pub struct VerdictService<P> {
    corpus: Arc<IncidentCorpus>,
    tips: Arc<TipBook>,
    estimator: FaultEstimator,
    narrator: Arc<P>,
    narrative: NarrativeConfig,
}

impl<P> Clone for VerdictService<P> {
    fn clone(&self) -> Self {
        Self {
            corpus: Arc::clone(&self.corpus),
            tips: Arc::clone(&self.tips),
            estimator: self.estimator.clone(),
            narrator: Arc::clone(&self.narrator),
            narrative: self.narrative,
        }
    }
}

impl<P> VerdictService<P>
where
    P: NarrativeProvider,
{
    pub fn new(
        corpus: Arc<IncidentCorpus>,
        tips: Arc<TipBook>,
        narrator: Arc<P>,
        estimator: EstimatorConfig,
        narrative: NarrativeConfig,
    ) -> Self {
        Self {
            corpus,
            tips,
            estimator: FaultEstimator::new(estimator),
            narrator,
            narrative,
        }
    }

    pub fn corpus(&self) -> &IncidentCorpus {
        &self.corpus
    }

    /// Fault split and supporting precedents without any narrative.
    pub fn estimate(
        &self,
        request: VerdictRequest,
    ) -> Result<FaultEstimateResponse, VerdictRequestError> {
        let context = request.into_context()?;
        let assessment = self.estimator.assess(&context.query, self.corpus.records());
        Ok(FaultEstimateResponse {
            incident_kind: context.kind,
            precedents: assessment.matches.iter().map(PrecedentView::from).collect(),
            estimate: assessment.estimate,
            assessed_at: Utc::now(),
        })
    }

    pub async fn evaluate(
        &self,
        request: VerdictRequest,
    ) -> Result<VerdictResponse, VerdictRequestError> {
        let (context, assessment) = self.prepare(request)?;
        let pro_tip = {
            let mut rng = rand::rng();
            self.pick_tip(&context, &mut rng)
        };
        Ok(self.render(context, assessment, pro_tip).await)
    }

    /// Same as [`VerdictService::evaluate`] with a caller-supplied tip RNG.
    pub async fn evaluate_with_rng<R: Rng + Send>(
        &self,
        request: VerdictRequest,
        rng: &mut R,
    ) -> Result<VerdictResponse, VerdictRequestError> {
        let (context, assessment) = self.prepare(request)?;
        let pro_tip = self.pick_tip(&context, rng);
        Ok(self.render(context, assessment, pro_tip).await)
    }

    fn prepare(
        &self,
        request: VerdictRequest,
    ) -> Result<(IncidentContext, FaultAssessment<'_>), VerdictRequestError> {
        let context = request.into_context()?;
        let assessment = self.estimator.assess(&context.query, self.corpus.records());
        info!(
            incident = %context.incident_label,
            fault_a = assessment.estimate.fault_a,
            confidence = %assessment.estimate.confidence,
            precedents = assessment.matches.len(),
            "fault estimated"
        );
        Ok((context, assessment))
    }

    fn pick_tip<R: Rng + ?Sized>(&self, context: &IncidentContext, rng: &mut R) -> String {
        self.tips
            .pick(context.kind, context.steward_notes.as_deref(), rng)
    }

    async fn render(
        &self,
        context: IncidentContext,
        assessment: FaultAssessment<'_>,
        pro_tip: String,
    ) -> VerdictResponse {
        let FaultAssessment { estimate, matches } = assessment;
        let mut verdict = Verdict::canned(&context, &estimate, &pro_tip);

        let request = NarrativeRequest::for_incident(&context, &estimate, &matches);
        let narrative_source =
            match request_narrative(self.narrator.as_ref(), &request, &self.narrative).await {
                Ok(response) => match VerdictPatch::parse(&response) {
                    Some(patch) => {
                        patch.apply(&mut verdict);
                        NarrativeSource::Model
                    }
                    None => {
                        warn!("narrative response was not valid JSON, using canned verdict");
                        NarrativeSource::Fallback
                    }
                },
                Err(NarrativeError::Unavailable(reason)) => {
                    debug!(%reason, "narrative provider unavailable, using canned verdict");
                    NarrativeSource::Fallback
                }
                Err(err) => {
                    warn!(error = %err, "narrative request failed, using canned verdict");
                    NarrativeSource::Fallback
                }
            };

        verdict.explanation = format!("{}\n\n{pro_tip}", verdict.explanation);

        VerdictResponse {
            verdict,
            precedents: matches.iter().map(PrecedentView::from).collect(),
            estimate,
            narrative_source,
            assessed_at: Utc::now(),
        }
    }
}
