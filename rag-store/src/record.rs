//! Core data models used by the library.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Query parameters for retrieval.
#[derive(Clone, Debug)]
pub struct RagQuery<'a> {
    pub text: &'a str,
    pub top_k: u64,
    pub filter: Option<RagFilter>,
}

/// A single retrieval hit with score, text and source.
///
/// `payload` is the whole stored payload as a JSON object (it repeats
/// `text` and `source` when the indexer stored them there).
#[derive(Clone, Debug, PartialEq)]
pub struct RagHit {
    pub score: f32,
    pub text: String,
    pub source: Option<String>,
    pub payload: Value,
}

/// Exact-match metadata filter. All conditions must hold.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RagFilter {
    /// Field/value pairs, e.g. `("date", "2025-10-20")`.
    pub equals: Vec<(String, Value)>,
}

impl RagFilter {
    /// Adds an equality condition.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.equals.push((field.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.equals.is_empty()
    }

    /// Value required for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.equals.iter().find(|(k, _)| k == field).map(|(_, v)| v)
    }
}
