//! Embedding provider backed by the shared [`LlmService`].

use std::sync::Arc;

use ai_llm_service::LlmService;
use tracing::warn;

use crate::{EmbeddingsProvider, RagError};

/// Embeds queries with the service's embedding profile.
#[derive(Clone)]
pub struct LlmEmbedder {
    svc: Arc<LlmService>,
    /// Expected dimension; unchecked when `None`.
    dim: Option<usize>,
}

impl LlmEmbedder {
    pub fn new(svc: Arc<LlmService>, dim: Option<usize>) -> Self {
        Self { svc, dim }
    }
}

impl EmbeddingsProvider for LlmEmbedder {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<f32>, RagError>> + Send + 'a>>
    {
        Box::pin(async move {
            let vector = self.svc.embed(text).await?;
            check_dim(vector, self.dim)
        })
    }
}

fn check_dim(vector: Vec<f32>, want: Option<usize>) -> Result<Vec<f32>, RagError> {
    match want {
        Some(want) if vector.len() != want => {
            warn!(got = vector.len(), want, "embedding dimension mismatch");
            Err(RagError::VectorSizeMismatch {
                got: vector.len(),
                want,
            })
        }
        _ => Ok(vector),
    }
}
