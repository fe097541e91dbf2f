use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};

use super::domain::VerdictRequest;
use super::narrative::NarrativeProvider;
use super::service::VerdictService;
use crate::error::AppError;

/// Router builder exposing the verdict and fault-estimate endpoints.
pub fn verdict_router<P>(service: Arc<VerdictService<P>>) -> Router
where
    P: NarrativeProvider + 'static,
{
    Router::new()
        .route("/api/v1/verdict", post(verdict_handler::<P>))
        .route("/api/v1/fault-estimate", post(estimate_handler::<P>))
        .with_state(service)
}

pub(crate) async fn verdict_handler<P>(
    State(service): State<Arc<VerdictService<P>>>,
    axum::Json(request): axum::Json<VerdictRequest>,
) -> Response
where
    P: NarrativeProvider + 'static,
{
    match service.evaluate(request).await {
        Ok(response) => (StatusCode::OK, axum::Json(response)).into_response(),
        Err(error) => AppError::from(error).into_response(),
    }
}

pub(crate) async fn estimate_handler<P>(
    State(service): State<Arc<VerdictService<P>>>,
    axum::Json(request): axum::Json<VerdictRequest>,
) -> Response
where
    P: NarrativeProvider + 'static,
{
    match service.estimate(request) {
        Ok(response) => (StatusCode::OK, axum::Json(response)).into_response(),
        Err(error) => AppError::from(error).into_response(),
    }
}
