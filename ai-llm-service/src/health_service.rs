//! Health probes for the configured LLM backends.
//!
//! - Ollama: `GET {endpoint}/api/tags`, then look for the model among the tags
//! - OpenAI: `GET {endpoint}/v1/models` with Bearer auth, then look for the model id
//!
//! [`HealthService::check`] never fails: every error becomes `ok = false`
//! so the result can be served from `/health` as is.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{AiLlmError, HealthError, HttpError, make_snippet};

/// A serializable health snapshot for a single profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthStatus {
    /// `ollama` or `openai`.
    pub provider: String,
    pub endpoint: String,
    pub model: Option<String>,
    pub ok: bool,
    /// Probe latency in milliseconds.
    pub latency_ms: u128,
    pub message: String,
}

impl HealthStatus {
    fn new(cfg: &LlmModelConfig, ok: bool, latency_ms: u128, message: impl Into<String>) -> Self {
        Self {
            provider: cfg.provider.as_str().to_string(),
            endpoint: cfg.endpoint.clone(),
            model: Some(cfg.model.clone()),
            ok,
            latency_ms,
            message: message.into(),
        }
    }
}

/// Health checker reusing one HTTP client for every probe.
pub struct HealthService {
    client: reqwest::Client,
    timeout: Duration,
}

impl HealthService {
    /// Creates a checker with an optional per-probe timeout (seconds, default 10).
    ///
    /// # Errors
    /// Returns [`AiLlmError::HttpTransport`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, AiLlmError> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(10));
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        debug!(timeout_secs = timeout.as_secs(), "HealthService initialized");
        Ok(Self { client, timeout })
    }

    /// Probes one profile. Failures are reported in the status, not returned.
    pub async fn check(&self, cfg: &LlmModelConfig) -> HealthStatus {
        let started = Instant::now();
        let result = match cfg.provider {
            LlmProvider::Ollama => self.probe_ollama(cfg).await,
            LlmProvider::OpenAI => self.probe_openai(cfg).await,
        };
        let latency = started.elapsed().as_millis();

        let status = match result {
            Ok(true) => HealthStatus::new(cfg, true, latency, "backend reachable; model available"),
            Ok(false) => HealthStatus::new(cfg, false, latency, "backend reachable; model not listed"),
            Err(e) => HealthStatus::new(cfg, false, latency, e.to_string()),
        };

        if status.ok {
            info!(
                provider = %status.provider,
                model = %cfg.model,
                latency_ms = status.latency_ms,
                "health probe passed"
            );
        } else {
            warn!(
                provider = %status.provider,
                model = %cfg.model,
                latency_ms = status.latency_ms,
                message = %status.message,
                "health probe failed"
            );
        }
        status
    }

    /// Probes several profiles in order.
    pub async fn check_many(&self, configs: &[LlmModelConfig]) -> Vec<HealthStatus> {
        let mut out = Vec::with_capacity(configs.len());
        for cfg in configs {
            out.push(self.check(cfg).await);
        }
        out
    }

    /// `Ok(true)` when the model is listed under `/api/tags`.
    async fn probe_ollama(&self, cfg: &LlmModelConfig) -> Result<bool, AiLlmError> {
        #[derive(Deserialize)]
        struct Tag {
            name: String,
        }
        #[derive(Deserialize)]
        struct Tags {
            #[serde(default)]
            models: Vec<Tag>,
        }

        let url = format!("{}/api/tags", cfg.endpoint.trim_end_matches('/'));
        let resp = self.get(&url, None).await?;
        let tags: Tags = resp
            .json()
            .await
            .map_err(|e| HealthError::Decode(format!("/api/tags: {e}")))?;

        Ok(model_listed(tags.models.iter().map(|t| t.name.as_str()), &cfg.model))
    }

    /// `Ok(true)` when the model id appears under `/v1/models`.
    async fn probe_openai(&self, cfg: &LlmModelConfig) -> Result<bool, AiLlmError> {
        #[derive(Deserialize)]
        struct ModelItem {
            id: String,
        }
        #[derive(Deserialize)]
        struct Models {
            data: Vec<ModelItem>,
        }

        let api_key = cfg
            .api_key
            .as_deref()
            .ok_or_else(|| HealthError::Decode("missing OpenAI API key".into()))?;
        let url = format!("{}/v1/models", cfg.endpoint.trim_end_matches('/'));
        let resp = self.get(&url, Some(api_key)).await?;
        let models: Models = resp
            .json()
            .await
            .map_err(|e| HealthError::Decode(format!("/v1/models: {e}")))?;

        Ok(model_listed(models.data.iter().map(|m| m.id.as_str()), &cfg.model))
    }

    async fn get(&self, url: &str, bearer: Option<&str>) -> Result<reqwest::Response, AiLlmError> {
        debug!("GET {}", url);
        let mut req = self.client.get(url).timeout(self.timeout);
        if let Some(key) = bearer {
            let value = header::HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| HealthError::Decode(format!("invalid API key header: {e}")))?;
            req = req.header(header::AUTHORIZATION, value);
        }

        let resp = req.send().await?;
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        Err(HealthError::HttpStatus(HttpError {
            status,
            url: url.to_string(),
            snippet: make_snippet(&text),
        })
        .into())
    }
}

/// Matches `model` against listed names; a missing `:tag` means `:latest`.
fn model_listed<'a>(mut names: impl Iterator<Item = &'a str>, model: &str) -> bool {
    let wanted = with_default_tag(model);
    names.any(|n| n == model || with_default_tag(n) == wanted)
}

fn with_default_tag(name: &str) -> String {
    if name.contains(':') {
        name.to_string()
    } else {
        format!("{name}:latest")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_model_matches_latest() {
        let names = ["llama3.1:latest", "nomic-embed-text:v1.5"];
        assert!(model_listed(names.iter().copied(), "llama3.1"));
        assert!(model_listed(names.iter().copied(), "nomic-embed-text:v1.5"));
        assert!(!model_listed(names.iter().copied(), "nomic-embed-text"));
    }

    #[tokio::test]
    async fn unreachable_backend_reports_not_ok() {
        let cfg = LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: "llama3".into(),
            endpoint: "http://127.0.0.1:9".into(),
            api_key: None,
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: None,
        };
        let svc = HealthService::new(Some(1)).unwrap();
        let status = svc.check(&cfg).await;
        assert!(!status.ok);
        assert_eq!(status.provider, "ollama");
    }
}
