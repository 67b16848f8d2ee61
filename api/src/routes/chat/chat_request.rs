use assistant_core::{ChatQuery, ConversationMessage, QueryFilters};
use serde::Deserialize;

use crate::core::http::response_envelope::ApiErrorDetail;
use crate::error_handler::{AppError, AppResult};

/// Longest accepted question, in characters.
pub const MAX_QUESTION_CHARS: usize = 1000;

/// Request payload for `/api/v1/chat` and `/api/v1/chat/stream`.
///
/// Field names are snake_case; the camelCase spellings are accepted too.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub question: String,
    #[serde(default, alias = "sessionId")]
    pub session_id: Option<String>,
    #[serde(default, alias = "conversationHistory")]
    pub conversation_history: Option<Vec<ConversationMessage>>,
    #[serde(default)]
    pub filters: Option<QueryFilters>,
    /// Shorthand for `filters.appointment_date`.
    #[serde(default, alias = "appointmentDate")]
    pub appointment_date: Option<String>,
    /// Shorthand for `filters.service_type`.
    #[serde(default, alias = "serviceType")]
    pub service_type: Option<String>,
}

impl ChatRequest {
    /// Validates the request and turns it into a processor query.
    pub fn into_query(self) -> AppResult<ChatQuery> {
        let mut details = Vec::new();
        if self.question.trim().is_empty() {
            details.push(ApiErrorDetail::field("question", "Question cannot be empty"));
        } else if self.question.chars().count() > MAX_QUESTION_CHARS {
            details.push(ApiErrorDetail::field(
                "question",
                format!("Question cannot exceed {MAX_QUESTION_CHARS} characters"),
            ));
        }
        if !details.is_empty() {
            return Err(AppError::Validation(details));
        }

        let filters = merge_filters(self.filters, self.appointment_date, self.service_type);

        Ok(ChatQuery {
            question: self.question,
            session_id: self.session_id,
            conversation_history: self.conversation_history,
            filters,
        })
    }
}

/// Folds the top-level shorthands into `filters`; explicit values win.
fn merge_filters(
    filters: Option<QueryFilters>,
    appointment_date: Option<String>,
    service_type: Option<String>,
) -> Option<QueryFilters> {
    let mut f = filters.unwrap_or_default();
    if f.appointment_date.is_none() {
        f.appointment_date = appointment_date;
    }
    if f.service_type.is_none() {
        f.service_type = service_type;
    }

    if f == QueryFilters::default() {
        None
    } else {
        Some(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(v: serde_json::Value) -> ChatRequest {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn blank_question_is_rejected() {
        let err = parse(json!({"question": "   "})).into_query().unwrap_err();
        assert!(matches!(err, AppError::Validation(ref d) if d.len() == 1));
    }

    #[test]
    fn question_length_is_counted_in_chars() {
        let ok = parse(json!({"question": "é".repeat(MAX_QUESTION_CHARS)}));
        assert!(ok.into_query().is_ok());

        let long = parse(json!({"question": "a".repeat(MAX_QUESTION_CHARS + 1)}));
        assert!(matches!(long.into_query(), Err(AppError::Validation(_))));
    }

    #[test]
    fn camel_case_fields_are_accepted() {
        let q = parse(json!({
            "question": "What is booked?",
            "sessionId": "s-1",
            "serviceType": "Oil Change"
        }))
        .into_query()
        .unwrap();
        assert_eq!(q.session_id.as_deref(), Some("s-1"));
        assert_eq!(
            q.filters.and_then(|f| f.service_type).as_deref(),
            Some("Oil Change")
        );
    }

    #[test]
    fn explicit_filters_win_over_shorthands() {
        let f = merge_filters(
            Some(QueryFilters {
                appointment_date: Some("2025-10-20".into()),
                ..Default::default()
            }),
            Some("2025-01-01".into()),
            Some("Brakes".into()),
        )
        .unwrap();
        assert_eq!(f.appointment_date.as_deref(), Some("2025-10-20"));
        assert_eq!(f.service_type.as_deref(), Some("Brakes"));
    }

    #[test]
    fn no_filters_at_all_stays_none() {
        assert_eq!(merge_filters(None, None, None), None);
        assert_eq!(merge_filters(Some(QueryFilters::default()), None, None), None);
    }
}
