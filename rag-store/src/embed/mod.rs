//! Query embedding abstraction.

use crate::errors::RagError;
use std::{future::Future, pin::Pin};

/// Asynchronous embedding provider.
///
/// Implement this trait to plug in another embedding backend; the default
/// one is [`llm::LlmEmbedder`].
pub trait EmbeddingsProvider: Send + Sync {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, RagError>> + Send + 'a>>;
}

pub mod llm;
