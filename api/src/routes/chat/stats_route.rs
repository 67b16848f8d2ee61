use axum::{extract::State, http::StatusCode, response::Response};

use crate::core::{app_state::AppState, http::response_envelope::ApiResponse};

/// Handler: GET /api/v1/chat/stats
pub async fn chat_stats(State(state): State<AppState>) -> Response {
    ApiResponse::success(state.processor.get_statistics())
        .into_response_with_status(StatusCode::OK)
}
