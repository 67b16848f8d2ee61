use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::core::app_state::AppState;

/// Handler: GET /health
///
/// `200` with the report when every backend answers, `503` otherwise.
pub async fn health(State(state): State<AppState>) -> Response {
    let report = state.health.check().await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        warn!(
            vector_db_available = report.vector_db_available,
            llm_down = report.llm.iter().filter(|s| !s.ok).count(),
            "health: degraded"
        );
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report)).into_response()
}
