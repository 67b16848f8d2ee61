//! Turn ranked documents into the prompt context block.

use crate::api_types::RetrievedDocument;

/// Context text used when retrieval found nothing.
pub const NO_CONTEXT: &str = "No relevant information found.";

/// How many leading documents feed the confidence score.
const CONFIDENCE_TOP_N: usize = 3;

/// Prompt context derived from one retrieval result.
#[derive(Clone, Debug, PartialEq)]
pub struct AssembledContext {
    pub text: String,
    pub sources: Vec<String>,
    pub confidence: f32,
}

/// Formats documents as numbered blocks and scores the result.
///
/// Each block reads `[i] (Relevance: 0.91)` followed by the document text,
/// 1-indexed in ranked order, blocks separated by a blank line.
///
/// # Example
/// ```
/// use assistant_core::{RetrievedDocument, context::assemble};
/// use serde_json::json;
///
/// let docs = vec![RetrievedDocument {
///     text: "Appointment ID: 42".into(),
///     metadata: json!({ "source": "Appointment #42" }),
///     score: 0.91,
/// }];
/// let ctx = assemble(&docs);
/// assert_eq!(ctx.text, "[1] (Relevance: 0.91)\nAppointment ID: 42");
/// assert_eq!(ctx.sources, vec!["Appointment #42"]);
/// ```
pub fn assemble(docs: &[RetrievedDocument]) -> AssembledContext {
    if docs.is_empty() {
        return AssembledContext {
            text: NO_CONTEXT.to_string(),
            sources: Vec::new(),
            confidence: 0.0,
        };
    }

    let text = docs
        .iter()
        .enumerate()
        .map(|(i, d)| format!("[{}] (Relevance: {:.2})\n{}", i + 1, d.score, d.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    let sources = docs
        .iter()
        .map(|d| d.source().unwrap_or_default().to_string())
        .collect();

    AssembledContext {
        text,
        sources,
        confidence: confidence(docs),
    }
}

/// Arithmetic mean of the first `min(3, n)` scores; `0.0` for no documents.
pub fn confidence(docs: &[RetrievedDocument]) -> f32 {
    let top = &docs[..docs.len().min(CONFIDENCE_TOP_N)];
    if top.is_empty() {
        return 0.0;
    }
    top.iter().map(|d| d.score).sum::<f32>() / top.len() as f32
}
