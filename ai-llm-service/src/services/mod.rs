pub(crate) mod line_buffer;
pub mod ollama_service;
pub mod open_ai_service;
