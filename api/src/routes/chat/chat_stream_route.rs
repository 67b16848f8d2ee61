//! POST /api/v1/chat/stream: answers a question as Server-Sent Events.
//!
//! Every event carries one `ChatStreamChunk` as JSON in its `data` field.
//! The last event has `is_final = true`. A client disconnect drops the
//! chunk stream and with it the upstream model request.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};

use crate::{
    core::app_state::AppState, error_handler::AppResult, routes::chat::chat_request::ChatRequest,
};

/// Handler: POST /api/v1/chat/stream
///
/// # Example
/// ```bash
/// curl -N -X POST http://127.0.0.1:8000/api/v1/chat/stream \
///   -H 'content-type: application/json' \
///   -d '{"question":"What services are booked for Monday?"}'
/// ```
pub async fn chat_stream(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    let Json(body) = payload?;
    let query = body.into_query()?;

    let events = state
        .processor
        .process_query_stream(query)
        .map(|chunk| Event::default().json_data(&chunk));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
