//! Shared message and stream types for chat backends.

use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error_handler::AiLlmError;

/// One chat message in the shape both Ollama and OpenAI accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// `system`, `user` or `assistant`.
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }
}

/// Incremental text fragments of one completion, in arrival order.
///
/// Dropping the stream drops the underlying HTTP body.
pub type TextStream = BoxStream<'static, Result<String, AiLlmError>>;
