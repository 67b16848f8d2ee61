//! Prompt builder: short system message + labeled context block + history.

use crate::types::ChatTurn;

/// Default system instructions for appointment answers.
///
/// Keep this short: it consistently improves steering without wasting tokens.
pub const DEFAULT_SYSTEM: &str = r#"
You are a helpful assistant for a vehicle service center. You answer questions about
scheduled service appointments: dates, times, status, vehicles, assigned mechanics and notes.
Use the provided context as ground truth. If the context does not contain the answer,
say so plainly and suggest contacting the service center. Never invent appointments.
"#;

/// Builds the system message that carries the retrieved context.
///
/// # Example
/// ```
/// use ai_llm_service::prompt::build_system_prompt;
/// let sys = build_system_prompt("[1] (Relevance: 0.91)\nAppointment ID: 42");
/// assert!(sys.contains("Context:"));
/// assert!(sys.contains("Appointment ID: 42"));
/// ```
pub fn build_system_prompt(context: &str) -> String {
    let mut out = String::with_capacity(DEFAULT_SYSTEM.len() + context.len() + 32);
    out.push_str(DEFAULT_SYSTEM.trim());
    out.push_str("\n\nContext:\n");
    out.push_str(context.trim());
    out
}

/// Assembles the full message list: system(context), history, then the question.
///
/// History turns keep their order and roles; the question is always the last
/// `user` message.
pub fn build_messages(prompt: &str, context: &str, history: Option<&[ChatTurn]>) -> Vec<ChatTurn> {
    let history = history.unwrap_or_default();
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatTurn::system(build_system_prompt(context)));
    messages.extend(history.iter().cloned());
    messages.push(ChatTurn::user(prompt.trim()));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_is_last_and_history_kept_in_order() {
        let history = vec![
            ChatTurn::new("user", "Hi"),
            ChatTurn::new("assistant", "Hello! How can I help?"),
        ];
        let msgs = build_messages("When is my next appointment?", "ctx", Some(&history));

        assert_eq!(msgs.len(), 4);
        assert_eq!(msgs[0].role, "system");
        assert_eq!(msgs[1], history[0]);
        assert_eq!(msgs[2], history[1]);
        assert_eq!(msgs[3], ChatTurn::user("When is my next appointment?"));
    }

    #[test]
    fn no_history_yields_system_and_user() {
        let msgs = build_messages("q", "No relevant information found.", None);
        assert_eq!(msgs.len(), 2);
        assert!(msgs[0].content.ends_with("No relevant information found."));
    }
}
