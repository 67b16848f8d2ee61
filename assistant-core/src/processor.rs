//! The query pipeline: retrieval → context assembly → generation.
//!
//! Both modes share [`QueryProcessor::prepare`]. Failures never escape:
//! the synchronous mode answers with an apology and the streaming mode ends
//! with a single apology chunk.

use std::sync::Arc;
use std::time::Instant;

use ai_llm_service::ChatTurn;
use async_stream::stream;
use futures::{StreamExt, stream::BoxStream};
use tracing::{error, info, instrument};

use crate::api_types::{ChatQuery, ChatResponse, ChatStreamChunk, Statistics};
use crate::cfg::AssistantConfig;
use crate::context::{AssembledContext, assemble};
use crate::error::AssistantError;
use crate::filters::build_filters;
use crate::history::format_history;
use crate::providers::{GenerationProvider, RetrievalProvider};

/// Answer returned by the synchronous mode on any failure.
pub const SYNC_APOLOGY: &str =
    "I apologize, but I'm having trouble processing your request. Please try again.";

/// Content of the terminal chunk of a failed stream.
pub const STREAM_APOLOGY: &str = "I apologize, but I'm having trouble processing your request.";

/// Characters of the question written to logs.
const QUESTION_LOG_CHARS: usize = 50;

/// Chunks of one streamed answer; always ends with an `is_final` chunk.
pub type ChatStream = BoxStream<'static, ChatStreamChunk>;

/// Shared, stateless query processor.
///
/// Cheap to clone; one instance serves concurrent requests.
#[derive(Clone)]
pub struct QueryProcessor {
    retrieval: Arc<dyn RetrievalProvider>,
    generation: Arc<dyn GenerationProvider>,
    cfg: AssistantConfig,
}

/// Everything generation needs besides the question.
struct Prepared {
    context: AssembledContext,
    history: Option<Vec<ChatTurn>>,
}

impl QueryProcessor {
    pub fn new(
        retrieval: Arc<dyn RetrievalProvider>,
        generation: Arc<dyn GenerationProvider>,
        cfg: AssistantConfig,
    ) -> Self {
        Self {
            retrieval,
            generation,
            cfg,
        }
    }

    /// Answers `query` in one piece. Never fails.
    #[instrument(skip_all, fields(session_id = tracing::field::Empty))]
    pub async fn process_query(&self, query: ChatQuery) -> ChatResponse {
        let session_id = resolve_session_id(query.session_id.as_deref());
        tracing::Span::current().record("session_id", session_id.as_str());
        let started = Instant::now();
        info!(question = %preview(&query.question), "processing query");

        let (answer, context) = match self.answer(&query).await {
            Ok((answer, context)) => (answer, Some(context)),
            Err(e) => {
                error!(error = ?e, "query failed; answering with apology");
                (SYNC_APOLOGY.to_string(), None)
            }
        };

        let processing_time_ms = elapsed_ms(started);
        let (confidence, sources) = context
            .map(|c| (c.confidence, c.sources))
            .unwrap_or_default();

        info!(processing_time_ms, confidence, "query processed");

        ChatResponse {
            answer,
            session_id,
            from_cache: false,
            processing_time_ms,
            timestamp: chrono::Utc::now(),
            confidence,
            sources,
        }
    }

    /// Answers `query` as a lazy chunk stream.
    ///
    /// Nothing runs until the stream is polled. Dropping it cancels the
    /// provider stream.
    pub fn process_query_stream(&self, query: ChatQuery) -> ChatStream {
        let this = self.clone();
        let session_id = resolve_session_id(query.session_id.as_deref());

        let chunks = stream! {
            info!(session_id = %session_id, question = %preview(&query.question), "processing streaming query");

            let opened = match this.prepare(&query).await {
                Ok(p) => {
                    this.generation
                        .generate_response_stream(&query.question, &p.context.text, p.history.as_deref())
                        .await
                }
                Err(e) => Err(e),
            };

            let mut index: u32 = 0;
            let mut failed = false;

            match opened {
                Ok(mut fragments) => {
                    while let Some(item) = fragments.next().await {
                        match item {
                            Ok(text) => {
                                yield ChatStreamChunk {
                                    content: text,
                                    is_final: false,
                                    session_id: session_id.clone(),
                                    chunk_index: index,
                                };
                                index += 1;
                            }
                            Err(e) => {
                                error!(session_id = %session_id, error = ?e, chunks = index, "answer stream broke");
                                failed = true;
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    error!(session_id = %session_id, error = ?e, "could not start answer stream");
                    failed = true;
                }
            }

            if failed {
                yield ChatStreamChunk {
                    content: STREAM_APOLOGY.to_string(),
                    is_final: true,
                    session_id: session_id.clone(),
                    chunk_index: 0,
                };
            } else {
                info!(session_id = %session_id, chunks = index, "streaming query completed");
                yield ChatStreamChunk {
                    content: String::new(),
                    is_final: true,
                    session_id: session_id.clone(),
                    chunk_index: index,
                };
            }
        };

        chunks.boxed()
    }

    /// Current provider availability and limits.
    pub fn get_statistics(&self) -> Statistics {
        Statistics {
            vector_db_type: self.retrieval.vector_db_type().to_string(),
            max_context_docs: self.cfg.max_context_docs,
            llm_available: self.generation.is_available(),
            vector_db_available: self.retrieval.is_available(),
        }
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.cfg
    }

    async fn answer(&self, query: &ChatQuery) -> Result<(String, AssembledContext), AssistantError> {
        let p = self.prepare(query).await?;
        let answer = self
            .generation
            .generate_response(&query.question, &p.context.text, p.history.as_deref())
            .await?;
        Ok((answer, p.context))
    }

    /// Single retrieval call, then context assembly and history formatting.
    async fn prepare(&self, query: &ChatQuery) -> Result<Prepared, AssistantError> {
        let filter = build_filters(query.filters.as_ref());
        let docs = self
            .retrieval
            .search(&query.question, self.cfg.max_context_docs, filter)
            .await?;

        let context = assemble(&docs);
        info!(
            docs = docs.len(),
            confidence = context.confidence,
            "context assembled"
        );

        Ok(Prepared {
            context,
            history: format_history(query.conversation_history.as_deref()),
        })
    }
}

/// Caller's session id, or a fresh one when absent or blank.
fn resolve_session_id(requested: Option<&str>) -> String {
    match requested.map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => services::uuid::new_session_id(),
    }
}

fn preview(question: &str) -> String {
    question.chars().take(QUESTION_LOG_CHARS).collect()
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supplied_session_id_is_kept() {
        assert_eq!(resolve_session_id(Some("abc-123")), "abc-123");
    }

    #[test]
    fn missing_or_blank_session_id_is_generated() {
        let a = resolve_session_id(None);
        let b = resolve_session_id(Some("  "));
        assert_eq!(a.len(), 36);
        assert_ne!(a, b);
    }

    #[test]
    fn preview_counts_chars_not_bytes() {
        let q = "é".repeat(80);
        assert_eq!(preview(&q).chars().count(), 50);
    }
}
