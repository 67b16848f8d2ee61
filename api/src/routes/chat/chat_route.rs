//! POST /api/v1/chat: answers a question in one piece.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
};
use tracing::debug;

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::AppResult,
    routes::chat::chat_request::ChatRequest,
};

/// Handler: POST /api/v1/chat
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8000/api/v1/chat \
///   -H 'content-type: application/json' \
///   -d '{"question":"Do I have an appointment tomorrow?","service_type":"Oil Change"}'
/// ```
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(body) = payload?;
    let query = body.into_query()?;

    let reply = state.processor.process_query(query).await;
    debug!(
        session_id = %reply.session_id,
        sources = reply.sources.len(),
        "chat: answered"
    );

    Ok(ApiResponse::success(reply).into_response_with_status(StatusCode::OK))
}
