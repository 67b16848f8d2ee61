use std::sync::Arc;

use ai_llm_service::{LlmService, health_service::HealthStatus};
use assistant_core::QueryProcessor;
use futures::{FutureExt, future::BoxFuture};
use rag_store::RagStore;
use serde::Serialize;
use tracing::warn;

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub processor: QueryProcessor,
    pub health: Arc<dyn HealthProbe>,
}

impl AppState {
    pub fn new(processor: QueryProcessor, health: Arc<dyn HealthProbe>) -> Self {
        Self { processor, health }
    }
}

/// Snapshot served by `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    /// `ok` or `degraded`.
    pub status: &'static str,
    pub llm: Vec<HealthStatus>,
    pub vector_db_type: String,
    pub vector_db_available: bool,
}

impl HealthReport {
    pub fn new(llm: Vec<HealthStatus>, vector_db_type: &str, vector_db_available: bool) -> Self {
        let healthy = vector_db_available && llm.iter().all(|s| s.ok);
        Self {
            status: if healthy { "ok" } else { "degraded" },
            llm,
            vector_db_type: vector_db_type.to_string(),
            vector_db_available,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "ok"
    }
}

/// Probes the backends behind the processor.
pub trait HealthProbe: Send + Sync {
    fn check(&self) -> BoxFuture<'_, HealthReport>;
}

/// Probes the live LLM endpoints and Qdrant.
pub struct BackendHealth {
    llm: Arc<LlmService>,
    store: Arc<RagStore>,
}

impl BackendHealth {
    pub fn new(llm: Arc<LlmService>, store: Arc<RagStore>) -> Self {
        Self { llm, store }
    }
}

impl HealthProbe for BackendHealth {
    fn check(&self) -> BoxFuture<'_, HealthReport> {
        async move {
            let (llm, store) = tokio::join!(self.llm.health_all(), self.store.health_check());
            if let Err(e) = &store {
                warn!(error = %e, "vector store health check failed");
            }
            HealthReport::new(llm, self.store.vector_db_type(), store.is_ok())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(ok: bool) -> HealthStatus {
        HealthStatus {
            provider: "ollama".into(),
            endpoint: "http://localhost:11434".into(),
            model: Some("llama3".into()),
            ok,
            latency_ms: 3,
            message: String::new(),
        }
    }

    #[test]
    fn report_is_ok_only_when_everything_is_up() {
        assert!(HealthReport::new(vec![status(true)], "qdrant", true).is_healthy());
        assert!(!HealthReport::new(vec![status(true)], "qdrant", false).is_healthy());
        let r = HealthReport::new(vec![status(true), status(false)], "qdrant", true);
        assert_eq!(r.status, "degraded");
    }
}
