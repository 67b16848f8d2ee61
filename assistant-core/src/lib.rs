//! Query pipeline of the appointment assistant.
//!
//! [`QueryProcessor`] retrieves ranked documents, assembles them into a
//! context block, and asks the language model for an answer, either in one
//! piece ([`QueryProcessor::process_query`]) or as a chunk stream
//! ([`QueryProcessor::process_query_stream`]). Backends sit behind
//! [`RetrievalProvider`] and [`GenerationProvider`]; implementations for
//! `rag_store::RagStore` and `ai_llm_service::LlmService` are included.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use assistant_core::{AssistantConfig, ChatQuery, QueryProcessor};
//! use ai_llm_service::LlmService;
//! use rag_store::{LlmEmbedder, RagConfig, RagStore};
//!
//! # #[tokio::main] async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = Arc::new(LlmService::from_env()?);
//! let rag_cfg = RagConfig::from_env()?;
//! let embedder = Arc::new(LlmEmbedder::new(llm.clone(), rag_cfg.embedding_dim));
//! let store = Arc::new(RagStore::new(rag_cfg, embedder)?);
//!
//! let processor = QueryProcessor::new(store, llm, AssistantConfig::from_env()?);
//! let reply = processor.process_query(ChatQuery::new("When is my next appointment?")).await;
//! println!("{} (confidence {:.2})", reply.answer, reply.confidence);
//! # Ok(()) }
//! ```

mod api_types;
mod backends;
mod cfg;
mod error;

pub mod context;
pub mod filters;
pub mod history;
pub mod processor;
pub mod providers;

pub use api_types::{
    ChatQuery, ChatResponse, ChatStreamChunk, ConversationMessage, QueryFilters, RetrievedDocument,
    Role, Statistics,
};
pub use cfg::AssistantConfig;
pub use error::AssistantError;
pub use processor::{ChatStream, QueryProcessor, STREAM_APOLOGY, SYNC_APOLOGY};
pub use providers::{FragmentStream, GenerationProvider, RetrievalProvider};
