//! Lightweight Ollama service for chat completions and embeddings.
//!
//! This module implements a thin client for the local Ollama API:
//! - `POST {endpoint}/api/chat`: chat completion (`stream=false` or NDJSON stream)
//! - `POST {endpoint}/api/embed`: embeddings retrieval
//!
//! It uses the universal configuration [`LlmModelConfig`] and ensures
//! that the selected provider is [`LlmProvider::Ollama`].
//!
//! # Examples
//!
//! ```no_run
//! use ai_llm_service::config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
//! use ai_llm_service::services::ollama_service::OllamaService;
//! use ai_llm_service::types::ChatTurn;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = LlmModelConfig {
//!     provider: LlmProvider::Ollama,
//!     model: "llama3.1:8b".into(),
//!     endpoint: "http://localhost:11434".into(),
//!     api_key: None,
//!     max_tokens: Some(256),
//!     temperature: Some(0.3),
//!     top_p: None,
//!     timeout_secs: Some(60),
//! };
//!
//! let svc = OllamaService::new(cfg)?;
//! let text = svc.chat(&[ChatTurn::user("Say hi.")]).await?;
//! println!("{text}");
//! # Ok(()) }
//! ```

use std::time::{Duration, Instant};

use async_stream::stream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
use crate::error_handler::{
    AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet,
};
use crate::services::line_buffer::LineBuffer;
use crate::types::{ChatTurn, TextStream};

/// Thin client for Ollama.
///
/// Initialized with a full [`LlmModelConfig`]. Reuses an HTTP client with
/// a configurable timeout.
#[derive(Debug)]
pub struct OllamaService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_chat: String,
    url_embed: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is not `Ollama`
    /// - `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`AiLlmError::HttpTransport`] if HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::Ollama {
            return Err(
                ProviderError::new(Provider::Ollama, ProviderErrorKind::InvalidProvider).into(),
            );
        }

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()?;

        let base = endpoint.trim_end_matches('/').to_string();
        let url_chat = format!("{}/api/chat", base);
        let url_embed = format!("{}/api/embed", base);

        info!(
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = timeout.as_secs(),
            "OllamaService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_chat,
            url_embed,
        })
    }

    /// Performs a **non-streaming** chat request via `/api/chat`.
    ///
    /// Mapped options:
    /// - `model`        ← `self.cfg.model`
    /// - `num_predict`  ← `self.cfg.max_tokens`
    /// - `temperature`  ← `self.cfg.temperature`
    /// - `top_p`        ← `self.cfg.top_p`
    #[instrument(skip_all, fields(model = %self.cfg.model, messages = messages.len()))]
    pub async fn chat(&self, messages: &[ChatTurn]) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let body = ChatRequest::from_cfg(&self.cfg, messages, false);

        debug!("POST {}", self.url_chat);
        let resp = self.client.post(&self.url_chat).json(&body).send().await?;
        let resp = self.ensure_success(resp, started).await?;

        let out: ChatResponse = resp.json().await.map_err(|e| {
            ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::Decode(format!(
                    "serde error: {e}; expected `message.content` with `stream=false`"
                )),
            )
        })?;

        if let Some(msg) = out.error {
            return Err(AiLlmError::Stream(msg));
        }
        let content = out
            .message
            .map(|m| m.content)
            .ok_or_else(|| ProviderError::new(Provider::Ollama, ProviderErrorKind::EmptyChoices))?;

        info!(
            latency_ms = started.elapsed().as_millis(),
            answer_len = content.len(),
            "chat completion completed"
        );
        Ok(content)
    }

    /// Opens a **streaming** chat request via `/api/chat` (`stream=true`).
    ///
    /// Each NDJSON frame with non-empty `message.content` becomes one fragment.
    /// The stream ends after the `done: true` frame; a body that ends earlier
    /// or an `error` frame surfaces as [`AiLlmError::Stream`].
    #[instrument(skip_all, fields(model = %self.cfg.model, messages = messages.len()))]
    pub async fn chat_stream(&self, messages: &[ChatTurn]) -> Result<TextStream, AiLlmError> {
        let started = Instant::now();
        let body = ChatRequest::from_cfg(&self.cfg, messages, true);

        debug!("POST {} (stream)", self.url_chat);
        let resp = self.client.post(&self.url_chat).json(&body).send().await?;
        let resp = self.ensure_success(resp, started).await?;

        let mut bytes = Box::pin(resp.bytes_stream());
        let fragments = stream! {
            let mut lines = LineBuffer::default();
            let mut finished = false;

            'read: while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(AiLlmError::HttpTransport(e));
                        finished = true;
                        break 'read;
                    }
                };
                for line in lines.push(&chunk) {
                    match parse_chat_frame(&line) {
                        Ok(frame) => {
                            if let Some(text) = frame.text {
                                yield Ok(text);
                            }
                            if frame.done {
                                finished = true;
                                break 'read;
                            }
                        }
                        Err(e) => {
                            yield Err(e);
                            finished = true;
                            break 'read;
                        }
                    }
                }
            }

            if !finished {
                match lines.finish().map(|l| parse_chat_frame(&l)) {
                    Some(Ok(frame)) => {
                        if let Some(text) = frame.text {
                            yield Ok(text);
                        }
                        if !frame.done {
                            yield Err(AiLlmError::Stream("stream ended before the final frame".into()));
                        }
                    }
                    Some(Err(e)) => yield Err(e),
                    None => yield Err(AiLlmError::Stream("stream ended before the final frame".into())),
                }
            }
        };

        Ok(Box::pin(fragments))
    }

    /// Retrieves a single embedding via `/api/embed`.
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let started = Instant::now();
        let body = EmbedRequest {
            model: &self.cfg.model,
            input,
        };

        debug!("POST {}", self.url_embed);
        let resp = self.client.post(&self.url_embed).json(&body).send().await?;
        let resp = self.ensure_success(resp, started).await?;

        let out: EmbedResponse = resp.json().await.map_err(|e| {
            ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::Decode(format!(
                    "serde error: {e}; expected `{{ embeddings: number[][] }}`"
                )),
            )
        })?;

        out.embeddings.into_iter().next().ok_or_else(|| {
            ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::Decode("empty `embeddings` in response".into()),
            )
            .into()
        })
    }

    /// Maps non-2xx responses to `HttpStatus` with a short body snippet.
    async fn ensure_success(
        &self,
        resp: reqwest::Response,
        started: Instant,
    ) -> Result<reqwest::Response, AiLlmError> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let url = resp.url().to_string();
        let text = resp.text().await.unwrap_or_default();
        let snippet = make_snippet(&text);

        error!(
            %status,
            %url,
            %snippet,
            latency_ms = started.elapsed().as_millis(),
            "Ollama returned non-success status"
        );

        Err(ProviderError::new(
            Provider::Ollama,
            ProviderErrorKind::HttpStatus(HttpError {
                status,
                url,
                snippet,
            }),
        )
        .into())
    }
}

/// One decoded NDJSON frame of a streaming chat.
#[derive(Debug, PartialEq)]
pub(crate) struct ChatFrame {
    pub(crate) text: Option<String>,
    pub(crate) done: bool,
}

/// Decodes a single `/api/chat` stream line.
pub(crate) fn parse_chat_frame(line: &str) -> Result<ChatFrame, AiLlmError> {
    let frame: ChatResponse = serde_json::from_str(line).map_err(|e| {
        ProviderError::new(
            Provider::Ollama,
            ProviderErrorKind::Decode(format!("invalid stream frame: {e}")),
        )
    })?;

    if let Some(msg) = frame.error {
        return Err(AiLlmError::Stream(msg));
    }

    Ok(ChatFrame {
        text: frame.message.map(|m| m.content).filter(|c| !c.is_empty()),
        done: frame.done,
    })
}

/* ==========================
HTTP payloads & options
========================== */

/// Request body for `/api/chat`.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ChatOptions>,
}

impl<'a> ChatRequest<'a> {
    /// Builds a request from config and messages.
    fn from_cfg(cfg: &'a LlmModelConfig, messages: &'a [ChatTurn], stream: bool) -> Self {
        let options = ChatOptions {
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            num_predict: cfg.max_tokens,
        };

        Self {
            model: &cfg.model,
            messages,
            stream,
            options: Some(options),
        }
    }
}

/// Subset of Ollama `options`.
#[derive(Debug, Default, Serialize)]
struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Response body for `/api/chat` (whole answer or one stream frame).
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ChatResponseMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}

/// Request body for `/api/embed`.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

/// Response body for `/api/embed`.
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_frame_yields_text() {
        let f = parse_chat_frame(
            r#"{"model":"m","message":{"role":"assistant","content":"Hel"},"done":false}"#,
        )
        .unwrap();
        assert_eq!(f.text.as_deref(), Some("Hel"));
        assert!(!f.done);
    }

    #[test]
    fn final_frame_has_no_text() {
        let f = parse_chat_frame(
            r#"{"model":"m","message":{"role":"assistant","content":""},"done":true,"eval_count":12}"#,
        )
        .unwrap();
        assert_eq!(f, ChatFrame { text: None, done: true });
    }

    #[test]
    fn error_frame_is_stream_error() {
        let err = parse_chat_frame(r#"{"error":"model not found"}"#).unwrap_err();
        assert!(matches!(err, AiLlmError::Stream(m) if m == "model not found"));
    }

    #[test]
    fn garbage_is_decode_error() {
        assert!(matches!(
            parse_chat_frame("not json"),
            Err(AiLlmError::Provider(_))
        ));
    }

    #[test]
    fn rejects_foreign_provider_config() {
        let cfg = LlmModelConfig {
            provider: LlmProvider::OpenAI,
            model: "gpt-4o-mini".into(),
            endpoint: "https://api.openai.com".into(),
            api_key: Some("k".into()),
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: None,
        };
        assert!(OllamaService::new(cfg).is_err());
    }
}
