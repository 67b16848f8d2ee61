//! Reshape caller history into the turns the model backend expects.

use ai_llm_service::ChatTurn;

use crate::api_types::ConversationMessage;

/// Maps each message to a `{role, content}` turn, keeping order and length.
///
/// `None` stays `None`; an empty slice yields an empty list rather than
/// `None`. The model receives the same messages either way. Timestamps are
/// dropped.
pub fn format_history(history: Option<&[ConversationMessage]>) -> Option<Vec<ChatTurn>> {
    history.map(|msgs| {
        msgs.iter()
            .map(|m| ChatTurn::new(m.role.as_str(), m.content.clone()))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_types::Role;

    #[test]
    fn absent_stays_absent() {
        assert_eq!(format_history(None), None);
    }

    #[test]
    fn empty_stays_empty() {
        assert_eq!(format_history(Some(&[][..])), Some(vec![]));
    }

    #[test]
    fn round_trips_role_and_content() {
        let mut stamped = ConversationMessage::new(Role::Assistant, "Sure, which vehicle?");
        stamped.timestamp = Some("2025-10-19T09:00:00Z".into());
        let history = vec![
            ConversationMessage::new(Role::User, "Book me in"),
            stamped,
            ConversationMessage::new(Role::System, "be brief"),
        ];

        let turns = format_history(Some(&history)).unwrap();
        assert_eq!(turns.len(), history.len());

        let back: Vec<(String, String)> =
            turns.into_iter().map(|t| (t.role, t.content)).collect();
        let expected: Vec<(String, String)> = history
            .iter()
            .map(|m| (m.role.as_str().to_string(), m.content.clone()))
            .collect();
        assert_eq!(back, expected);
    }
}
