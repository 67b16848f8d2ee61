//! Runtime configuration loaded from environment variables.

use crate::error::AssistantError;

const DEFAULT_MAX_CONTEXT_DOCS: usize = 5;

/// Knobs of the query processor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssistantConfig {
    /// Documents requested from retrieval per query.
    pub max_context_docs: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            max_context_docs: DEFAULT_MAX_CONTEXT_DOCS,
        }
    }
}

impl AssistantConfig {
    /// Reads `MAX_CONTEXT_DOCS` (default `5`).
    ///
    /// # Errors
    /// [`AssistantError::Config`] when the value is not a positive integer.
    ///
    /// # Example
    /// ```
    /// use assistant_core::AssistantConfig;
    /// let cfg = AssistantConfig::from_env().unwrap_or_default();
    /// assert!(cfg.max_context_docs >= 1);
    /// ```
    pub fn from_env() -> Result<Self, AssistantError> {
        match std::env::var("MAX_CONTEXT_DOCS") {
            Ok(v) if !v.trim().is_empty() => Ok(Self {
                max_context_docs: parse_max_docs(&v)?,
            }),
            _ => Ok(Self::default()),
        }
    }
}

fn parse_max_docs(raw: &str) -> Result<usize, AssistantError> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(AssistantError::Config(format!(
            "MAX_CONTEXT_DOCS must be a positive integer, got `{raw}`"
        ))),
    }
}
