//! LLM access for the appointment assistant: Ollama or OpenAI chat
//! (plain and streaming), query embeddings, and health probes.

pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod prompt;
pub mod service_profiles;
pub mod services;
pub mod telemetry;
pub mod types;

pub use error_handler::AiLlmError;
pub use service_profiles::LlmService;
pub use types::{ChatTurn, TextStream};
