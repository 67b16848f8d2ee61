//! Seams between the query processor and its external backends.
//!
//! Both traits are object safe so the processor can hold
//! `Arc<dyn RetrievalProvider>` / `Arc<dyn GenerationProvider>` and tests
//! can plug in in-memory doubles.

use ai_llm_service::ChatTurn;
use futures::{future::BoxFuture, stream::BoxStream};
use rag_store::RagFilter;

use crate::api_types::RetrievedDocument;
use crate::error::AssistantError;

/// Answer fragments in arrival order.
pub type FragmentStream = BoxStream<'static, Result<String, AssistantError>>;

/// Semantic search over the appointment documents.
pub trait RetrievalProvider: Send + Sync {
    /// Up to `top_k` documents ranked by descending relevance.
    ///
    /// `Ok(vec![])` means nothing matched; `Err` means the backend failed.
    fn search<'a>(
        &'a self,
        query: &'a str,
        top_k: usize,
        filter: Option<RagFilter>,
    ) -> BoxFuture<'a, Result<Vec<RetrievedDocument>, AssistantError>>;

    fn is_available(&self) -> bool;

    /// Short label of the backend, e.g. `qdrant`.
    fn vector_db_type(&self) -> &str;
}

/// Language model answering from a context block.
pub trait GenerationProvider: Send + Sync {
    fn generate_response<'a>(
        &'a self,
        prompt: &'a str,
        context: &'a str,
        history: Option<&'a [ChatTurn]>,
    ) -> BoxFuture<'a, Result<String, AssistantError>>;

    /// Opens a fragment stream. Errors before the first fragment are returned
    /// here; later ones arrive as stream items.
    fn generate_response_stream<'a>(
        &'a self,
        prompt: &'a str,
        context: &'a str,
        history: Option<&'a [ChatTurn]>,
    ) -> BoxFuture<'a, Result<FragmentStream, AssistantError>>;

    fn is_available(&self) -> bool;
}
