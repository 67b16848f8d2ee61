//! Provider implementations over the workspace's Qdrant store and LLM service.

use ai_llm_service::{ChatTurn, LlmService};
use futures::{FutureExt, StreamExt, TryStreamExt, future::BoxFuture};
use rag_store::{RagFilter, RagHit, RagStore};
use serde_json::{Map, Value};

use crate::api_types::RetrievedDocument;
use crate::error::AssistantError;
use crate::providers::{FragmentStream, GenerationProvider, RetrievalProvider};

impl RetrievalProvider for RagStore {
    fn search<'a>(
        &'a self,
        query: &'a str,
        top_k: usize,
        filter: Option<RagFilter>,
    ) -> BoxFuture<'a, Result<Vec<RetrievedDocument>, AssistantError>> {
        async move {
            let hits = RagStore::search(self, query, top_k as u64, filter).await?;
            Ok(hits.into_iter().map(document_from_hit).collect())
        }
        .boxed()
    }

    fn is_available(&self) -> bool {
        RagStore::is_available(self)
    }

    fn vector_db_type(&self) -> &str {
        RagStore::vector_db_type(self)
    }
}

impl GenerationProvider for LlmService {
    fn generate_response<'a>(
        &'a self,
        prompt: &'a str,
        context: &'a str,
        history: Option<&'a [ChatTurn]>,
    ) -> BoxFuture<'a, Result<String, AssistantError>> {
        async move {
            Ok(LlmService::generate_response(self, prompt, context, history).await?)
        }
        .boxed()
    }

    fn generate_response_stream<'a>(
        &'a self,
        prompt: &'a str,
        context: &'a str,
        history: Option<&'a [ChatTurn]>,
    ) -> BoxFuture<'a, Result<FragmentStream, AssistantError>> {
        async move {
            let stream = LlmService::generate_response_stream(self, prompt, context, history).await?;
            Ok(stream.map_err(AssistantError::from).boxed())
        }
        .boxed()
    }

    fn is_available(&self) -> bool {
        LlmService::is_available(self)
    }
}

/// Payload becomes metadata; `source` is filled from the hit when the
/// payload lacks it.
fn document_from_hit(hit: RagHit) -> RetrievedDocument {
    let mut metadata = match hit.payload {
        Value::Object(m) => m,
        _ => Map::new(),
    };
    if let Some(source) = hit.source {
        metadata.entry("source").or_insert(Value::String(source));
    }

    RetrievedDocument {
        text: hit.text,
        metadata: Value::Object(metadata),
        score: hit.score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hit_payload_becomes_metadata() {
        let doc = document_from_hit(RagHit {
            score: 0.77,
            text: "Appointment ID: 3".into(),
            source: Some("Appointment #3".into()),
            payload: json!({ "source": "Appointment #3", "status": "PENDING" }),
        });
        assert_eq!(doc.source(), Some("Appointment #3"));
        assert_eq!(doc.metadata["status"], "PENDING");
        assert_eq!(doc.score, 0.77);
    }

    #[test]
    fn non_object_payload_yields_empty_metadata() {
        let doc = document_from_hit(RagHit {
            score: 0.1,
            text: String::new(),
            source: None,
            payload: Value::Null,
        });
        assert_eq!(doc.metadata, json!({}));
        assert_eq!(doc.source(), None);
    }
}
