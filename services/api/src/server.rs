use crate::cli::ServeArgs;
use crate::infra::{build_verdict_service, AppState};
use crate::routes::with_verdict_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use steward_ai::config::AppConfig;
use steward_ai::error::AppError;
use steward_ai::telemetry;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let verdict_service = Arc::new(build_verdict_service(&config));
    info!(
        precedents = verdict_service.corpus().len(),
        mode = ?config.blend_mode,
        "verdict service initialised"
    );

    let app = with_verdict_routes(verdict_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "steward service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
