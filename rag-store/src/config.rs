//! Runtime configuration for retrieval.

use crate::errors::RagError;

const DEFAULT_QDRANT_URL: &str = "http://127.0.0.1:6334";
const DEFAULT_COLLECTION: &str = "appointments";

/// Configuration for Qdrant retrieval.
#[derive(Clone, Debug, PartialEq)]
pub struct RagConfig {
    /// Qdrant gRPC endpoint, e.g. `http://localhost:6334`.
    pub qdrant_url: String,
    /// Optional API key for Qdrant Cloud.
    pub qdrant_api_key: Option<String>,
    /// Collection holding the appointment documents.
    pub collection: String,
    /// Expected query vector size; checked after embedding when set.
    pub embedding_dim: Option<usize>,
    /// Exact search flag (false = HNSW ANN).
    pub exact_search: bool,
    /// Hits scoring below this are dropped by Qdrant.
    pub score_threshold: Option<f32>,
}

impl RagConfig {
    /// Creates a config for a given endpoint and collection with no threshold.
    pub fn new_default(url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            qdrant_url: url.into(),
            qdrant_api_key: None,
            collection: collection.into(),
            embedding_dim: None,
            exact_search: false,
            score_threshold: None,
        }
    }

    /// Reads the config from the environment.
    ///
    /// - `QDRANT_URL` (default `http://127.0.0.1:6334`)
    /// - `QDRANT_API_KEY` (optional)
    /// - `QDRANT_COLLECTION` (default `appointments`)
    /// - `EMBEDDING_DIM` (optional, usize)
    /// - `RAG_EXACT_SEARCH` (`true`/`1` to enable)
    /// - `RAG_SCORE_THRESHOLD` (optional, `0.0..=1.0`)
    ///
    /// # Errors
    /// Returns [`RagError::Config`] for unparsable numbers or an invalid result.
    pub fn from_env() -> Result<Self, RagError> {
        let cfg = Self {
            qdrant_url: env_opt("QDRANT_URL").unwrap_or_else(|| DEFAULT_QDRANT_URL.to_string()),
            qdrant_api_key: env_opt("QDRANT_API_KEY"),
            collection: env_opt("QDRANT_COLLECTION")
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            embedding_dim: parse_env("EMBEDDING_DIM")?,
            exact_search: env_opt("RAG_EXACT_SEARCH").is_some_and(|v| parse_flag(&v)),
            score_threshold: parse_env("RAG_SCORE_THRESHOLD")?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), RagError> {
        let url = self.qdrant_url.trim();
        if url.is_empty() {
            return Err(RagError::Config("qdrant_url is empty".into()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(RagError::Config(format!(
                "qdrant_url must start with http:// or https://, got `{url}`"
            )));
        }
        if self.collection.trim().is_empty() {
            return Err(RagError::Config("collection is empty".into()));
        }
        if self.embedding_dim == Some(0) {
            return Err(RagError::Config("embedding_dim must be > 0".into()));
        }
        if let Some(t) = self.score_threshold {
            if !(0.0..=1.0).contains(&t) {
                return Err(RagError::Config(format!(
                    "score_threshold must be within 0.0..=1.0, got {t}"
                )));
            }
        }
        Ok(())
    }
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>, RagError> {
    match env_opt(name) {
        Some(v) => v
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| RagError::Config(format!("{name} has an invalid value: `{v}`"))),
        None => Ok(None),
    }
}

fn parse_flag(v: &str) -> bool {
    matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
