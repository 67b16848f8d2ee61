//! Public API types re-used by external crates (e.g., the HTTP API layer).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Speaker of a conversation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// One prior turn supplied by the caller.
///
/// # Example
/// ```
/// use assistant_core::{ConversationMessage, Role};
/// let m: ConversationMessage =
///     serde_json::from_str(r#"{"role":"user","content":"Hi","timestamp":"2025-10-19T09:00:00Z"}"#).unwrap();
/// assert_eq!(m.role, Role::User);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
    /// Accepted for compatibility; not forwarded to the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ConversationMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: None,
        }
    }
}

/// Semantic filters narrowing retrieval.
///
/// Keys other than the named ones land in `extra` and are ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One ranked document handed to the context assembler.
#[derive(Clone, Debug, PartialEq)]
pub struct RetrievedDocument {
    pub text: String,
    /// JSON object; `source` names the originating record.
    pub metadata: Value,
    /// Similarity in `0.0..=1.0`, higher is more relevant.
    pub score: f32,
}

impl RetrievedDocument {
    /// `metadata.source` as a string, if present.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").and_then(Value::as_str)
    }
}

/// A question plus its optional session, history and filters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChatQuery {
    pub question: String,
    pub session_id: Option<String>,
    pub conversation_history: Option<Vec<ConversationMessage>>,
    pub filters: Option<QueryFilters>,
}

impl ChatQuery {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Default::default()
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_history(mut self, history: Vec<ConversationMessage>) -> Self {
        self.conversation_history = Some(history);
        self
    }

    pub fn with_filters(mut self, filters: QueryFilters) -> Self {
        self.filters = Some(filters);
        self
    }
}

/// Complete answer of a synchronous query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub session_id: String,
    /// Always `false`; no response cache exists.
    pub from_cache: bool,
    pub processing_time_ms: u64,
    pub timestamp: DateTime<Utc>,
    /// Mean score of the top (at most three) documents.
    pub confidence: f32,
    pub sources: Vec<String>,
}

/// One piece of a streamed answer.
///
/// Non-final chunks carry text and are numbered from `0`; the stream always
/// ends with exactly one `is_final` chunk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatStreamChunk {
    pub content: String,
    pub is_final: bool,
    pub session_id: String,
    pub chunk_index: u32,
}

/// Read-only runtime snapshot of the processor and its providers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub vector_db_type: String,
    pub max_context_docs: usize,
    pub llm_available: bool,
    pub vector_db_available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filters_keep_unknown_keys_in_extra() {
        let f: QueryFilters = serde_json::from_value(json!({
            "appointment_date": "2025-10-20",
            "mechanic": "Sam"
        }))
        .unwrap();
        assert_eq!(f.appointment_date.as_deref(), Some("2025-10-20"));
        assert_eq!(f.service_type, None);
        assert_eq!(f.extra.get("mechanic"), Some(&json!("Sam")));
    }

    #[test]
    fn unknown_role_is_rejected() {
        let r = serde_json::from_value::<ConversationMessage>(json!({
            "role": "tool",
            "content": "x"
        }));
        assert!(r.is_err());
    }

    #[test]
    fn statistics_serialize_as_flat_map() {
        let s = Statistics {
            vector_db_type: "qdrant".into(),
            max_context_docs: 5,
            llm_available: true,
            vector_db_available: false,
        };
        assert_eq!(
            serde_json::to_value(&s).unwrap(),
            json!({
                "vector_db_type": "qdrant",
                "max_context_docs": 5,
                "llm_available": true,
                "vector_db_available": false
            })
        );
    }
}
