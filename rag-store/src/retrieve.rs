//! Retrieval: embed the query, search Qdrant, map payloads to hits.

use crate::config::RagConfig;
use crate::embed::EmbeddingsProvider;
use crate::errors::RagError;
use crate::filters::to_qdrant_filter;
use crate::qdrant_facade::{QdrantFacade, SearchOptions};
use crate::record::{RagHit, RagQuery};

use serde_json::Value;
use tracing::{debug, trace};

/// Embeds the query text and returns ranked hits.
///
/// An empty result is `Ok(vec![])`; embedding or Qdrant failures are errors.
pub async fn rag_context(
    cfg: &RagConfig,
    client: &QdrantFacade,
    query: RagQuery<'_>,
    provider: &dyn EmbeddingsProvider,
) -> Result<Vec<RagHit>, RagError> {
    trace!(
        top_k = query.top_k,
        filtered = query.filter.is_some(),
        "retrieve::rag_context"
    );

    let qv = provider.embed(query.text).await?;
    let filter = query
        .filter
        .as_ref()
        .filter(|f| !f.is_empty())
        .map(to_qdrant_filter);

    let opts = SearchOptions {
        exact: cfg.exact_search,
        score_threshold: cfg.score_threshold,
    };
    let hits = client.search(qv, query.top_k, filter, opts).await?;

    let out: Vec<RagHit> = hits
        .into_iter()
        .map(|(score, payload)| hit_from_payload(score, payload))
        .collect();

    debug!(hits = out.len(), "retrieval completed");
    Ok(out)
}

/// Builds a hit from a stored payload (`text`, `source` and the rest).
pub(crate) fn hit_from_payload(score: f32, payload: Value) -> RagHit {
    let text = payload
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let source = payload
        .get("source")
        .and_then(Value::as_str)
        .map(str::to_string);

    RagHit {
        score,
        text,
        source,
        payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hit_reads_text_and_source() {
        let hit = hit_from_payload(
            0.87,
            json!({ "text": "Appointment ID: 12", "source": "Appointment #12", "status": "CONFIRMED" }),
        );
        assert_eq!(hit.text, "Appointment ID: 12");
        assert_eq!(hit.source.as_deref(), Some("Appointment #12"));
        assert_eq!(hit.payload["status"], "CONFIRMED");
    }

    #[test]
    fn missing_fields_are_tolerated() {
        let hit = hit_from_payload(0.1, json!({ "source": 5 }));
        assert_eq!(hit.text, "");
        assert_eq!(hit.source, None);
    }
}
