//! Typed error for the assistant-core crate.

use ai_llm_service::AiLlmError;
use rag_store::RagError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssistantError {
    /// The retrieval backend could not be queried.
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] RagError),

    /// The generation backend failed to open or finish an answer.
    #[error("generation failed: {0}")]
    Generation(#[from] AiLlmError),

    /// Retrieved data could not be turned into a prompt context.
    ///
    /// Reserved for assemblers that can fail; [`crate::context::assemble`]
    /// is infallible and never produces it.
    #[error("context assembly failed: {0}")]
    Assembly(String),

    /// Invalid processor configuration.
    #[error("config error: {0}")]
    Config(String),
}
