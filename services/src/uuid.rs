use uuid::Uuid;

/// Fresh random (v4) session id in hyphenated form.
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}
