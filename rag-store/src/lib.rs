//! Retrieval over Qdrant for the appointment assistant.
//!
//! This crate provides:
//! - [`RagConfig`] read from the environment
//! - query embedding through an [`EmbeddingsProvider`]
//! - filtered top-K similarity search returning [`RagHit`]s
//!
//! Ingestion is owned by a separate indexer; this crate only reads.

mod config;
mod embed;
mod errors;
mod filters;
mod qdrant_facade;
mod record;
mod retrieve;

pub use config::RagConfig;
pub use embed::{EmbeddingsProvider, llm::LlmEmbedder};
pub use errors::RagError;
pub use record::{RagFilter, RagHit, RagQuery};

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tracing::{debug, trace, warn};

/// High-level facade that wires configuration, embedder and Qdrant client.
///
/// This is the single entry point recommended for application code.
pub struct RagStore {
    cfg: RagConfig,
    client: qdrant_facade::QdrantFacade,
    embedder: Arc<dyn EmbeddingsProvider>,
    available: AtomicBool,
}

impl RagStore {
    /// Constructs a new store from the given configuration.
    ///
    /// # Errors
    /// Returns `RagError::Config`/`RagError::Qdrant` if the client cannot be built.
    pub fn new(cfg: RagConfig, embedder: Arc<dyn EmbeddingsProvider>) -> Result<Self, RagError> {
        trace!("RagStore::new collection={}", cfg.collection);
        let client = qdrant_facade::QdrantFacade::new(&cfg)?;
        Ok(Self {
            cfg,
            client,
            embedder,
            available: AtomicBool::new(true),
        })
    }

    /// Returns the `top_k` most similar documents for `query`.
    ///
    /// `Ok(vec![])` means nothing matched; `Err` means the backend could
    /// not be queried.
    pub async fn search(
        &self,
        query: &str,
        top_k: u64,
        filter: Option<RagFilter>,
    ) -> Result<Vec<RagHit>, RagError> {
        debug!(
            collection = self.client.collection(),
            top_k,
            filtered = filter.is_some(),
            "RagStore::search"
        );
        let q = RagQuery {
            text: query,
            top_k,
            filter,
        };
        let result = retrieve::rag_context(&self.cfg, &self.client, q, self.embedder.as_ref()).await;
        if let Err(e) = &result {
            warn!(error = %e, "retrieval failed");
        }
        self.available.store(result.is_ok(), Ordering::Relaxed);
        result
    }

    /// Whether the last backend call succeeded. Starts as `true`.
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }

    /// Label of the vector backend.
    pub fn vector_db_type(&self) -> &'static str {
        "qdrant"
    }

    /// Pings Qdrant and updates availability.
    pub async fn health_check(&self) -> Result<(), RagError> {
        let result = self.client.health_check().await;
        self.available.store(result.is_ok(), Ordering::Relaxed);
        result
    }

    pub fn config(&self) -> &RagConfig {
        &self.cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{future::Future, pin::Pin};

    struct FixedEmbedder;

    impl EmbeddingsProvider for FixedEmbedder {
        fn embed<'a>(
            &'a self,
            _text: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, RagError>> + Send + 'a>> {
            Box::pin(async { Ok(vec![0.1, 0.2, 0.3]) })
        }
    }

    #[tokio::test]
    async fn new_store_is_available_and_labelled() {
        let cfg = RagConfig::new_default("http://127.0.0.1:6334", "appointments");
        let store = RagStore::new(cfg, Arc::new(FixedEmbedder)).unwrap();
        assert!(store.is_available());
        assert_eq!(store.vector_db_type(), "qdrant");
    }

    #[tokio::test]
    async fn unreachable_qdrant_is_an_error_and_flips_availability() {
        let cfg = RagConfig::new_default("http://127.0.0.1:9", "appointments");
        let store = RagStore::new(cfg, Arc::new(FixedEmbedder)).unwrap();
        assert!(store.search("oil change", 5, None).await.is_err());
        assert!(!store.is_available());
    }
}
