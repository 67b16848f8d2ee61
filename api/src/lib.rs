//! HTTP surface of the appointment assistant.

use std::env;

mod core;
mod error_handler;
mod routes;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;
use tracing::{error, info};

pub use crate::core::app_state::{AppState, BackendHealth, HealthProbe, HealthReport};
pub use crate::core::http::response_envelope::{ApiError, ApiErrorDetail, ApiResponse};
pub use crate::error_handler::{AppError, AppResult};
pub use crate::routes::chat::chat_request::{ChatRequest, MAX_QUESTION_CHARS};

use crate::routes::{
    chat::{chat_route::chat, chat_stream_route::chat_stream, stats_route::chat_stats},
    health_route::health,
};

/// Listen address used when `API_ADDRESS` is unset.
pub const DEFAULT_ADDRESS: &str = "0.0.0.0:8000";

/// Builds the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/chat", post(chat))
        .route("/api/v1/chat/stream", post(chat_stream))
        .route("/api/v1/chat/stats", get(chat_stats))
        .route("/health", get(health))
        .fallback(not_found)
        .with_state(state)
}

/// Serves the API on `API_ADDRESS` until Ctrl+C.
pub async fn start(state: AppState) -> AppResult<()> {
    let addr = env::var("API_ADDRESS").unwrap_or_else(|_| DEFAULT_ADDRESS.to_string());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| AppError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!(%addr, "API listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("API stopped");
    Ok(())
}

async fn not_found() -> AppError {
    AppError::NotFound
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
