use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use steward_ai::config::AppConfig;
use steward_ai::precedents::{EstimatorConfig, IncidentCorpus};
use steward_ai::verdict::{OfflineNarrator, TipBook, VerdictService};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Loads the reference data once; missing files degrade to empty sets.
pub(crate) fn build_verdict_service(config: &AppConfig) -> VerdictService<OfflineNarrator> {
    let incidents = IncidentCorpus::load_or_empty(&config.corpus.dataset_path);
    verdict_service_with_corpus(config, incidents)
}

pub(crate) fn verdict_service_with_corpus(
    config: &AppConfig,
    incidents: IncidentCorpus,
) -> VerdictService<OfflineNarrator> {
    let tips = TipBook::load_or_default(&config.corpus.tips_path);

    VerdictService::new(
        Arc::new(incidents),
        Arc::new(tips),
        Arc::new(OfflineNarrator),
        EstimatorConfig::with_mode(config.blend_mode),
        config.narrative,
    )
}
