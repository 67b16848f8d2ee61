//! Shared LLM service with two profiles: `chat` and `embedding`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Backend clients are built eagerly, so a bad config fails at startup.
//! - Tracks whether the last call reached the backend (`is_available`).
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::service_profiles::LlmService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let svc = Arc::new(LlmService::from_env()?);
//!
//!     let answer = svc
//!         .generate_response("When is my oil change?", "[1] (Relevance: 0.88)\n...", None)
//!         .await?;
//!     println!("{answer}");
//!
//!     for status in svc.health_all().await {
//!         println!("{} ok={}", status.provider, status.ok);
//!     }
//!     Ok(())
//! }
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use futures::StreamExt;
use tracing::{debug, instrument, warn};

use crate::{
    config::{
        default_config::{config_chat, config_embedding},
        llm_model_config::LlmModelConfig,
        llm_provider::LlmProvider,
    },
    error_handler::AiLlmError,
    health_service::{HealthService, HealthStatus},
    prompt::build_messages,
    services::{ollama_service::OllamaService, open_ai_service::OpenAiService},
    types::{ChatTurn, TextStream},
};

/// Concrete client behind one profile.
enum Backend {
    Ollama(OllamaService),
    OpenAI(OpenAiService),
}

impl Backend {
    fn build(cfg: &LlmModelConfig) -> Result<Self, AiLlmError> {
        Ok(match cfg.provider {
            LlmProvider::Ollama => Backend::Ollama(OllamaService::new(cfg.clone())?),
            LlmProvider::OpenAI => Backend::OpenAI(OpenAiService::new(cfg.clone())?),
        })
    }

    async fn chat(&self, messages: &[ChatTurn]) -> Result<String, AiLlmError> {
        match self {
            Backend::Ollama(cli) => cli.chat(messages).await,
            Backend::OpenAI(cli) => cli.chat(messages).await,
        }
    }

    async fn chat_stream(&self, messages: &[ChatTurn]) -> Result<TextStream, AiLlmError> {
        match self {
            Backend::Ollama(cli) => cli.chat_stream(messages).await,
            Backend::OpenAI(cli) => cli.chat_stream(messages).await,
        }
    }

    async fn embeddings(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        match self {
            Backend::Ollama(cli) => cli.embeddings(input).await,
            Backend::OpenAI(cli) => cli.embeddings(input).await,
        }
    }
}

/// Shared service that answers questions over a retrieved context and
/// embeds queries for retrieval.
pub struct LlmService {
    chat_cfg: LlmModelConfig,
    embedding_cfg: LlmModelConfig,

    chat: Backend,
    embedding: Backend,

    health: HealthService,
    available: Arc<AtomicBool>,
}

impl LlmService {
    /// Creates a new service from explicit profiles.
    ///
    /// - `chat`: profile used for answers (sync and streaming).
    /// - `embedding`: profile used to vectorize queries.
    /// - `health_timeout_secs`: optional timeout for the health checker.
    pub fn new(
        chat: LlmModelConfig,
        embedding: LlmModelConfig,
        health_timeout_secs: Option<u64>,
    ) -> Result<Self, AiLlmError> {
        Ok(Self {
            chat: Backend::build(&chat)?,
            embedding: Backend::build(&embedding)?,
            chat_cfg: chat,
            embedding_cfg: embedding,
            health: HealthService::new(health_timeout_secs)?,
            available: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Builds both profiles from environment variables.
    ///
    /// See [`crate::config::default_config`] for the variables read.
    pub fn from_env() -> Result<Self, AiLlmError> {
        Self::new(config_chat()?, config_embedding()?, None)
    }

    /// Generates a complete answer for `prompt` grounded in `context`.
    ///
    /// `history` turns are placed between the system message and the question.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if the backend call fails.
    #[instrument(skip_all, fields(provider = self.chat_cfg.provider.as_str(), model = %self.chat_cfg.model))]
    pub async fn generate_response(
        &self,
        prompt: &str,
        context: &str,
        history: Option<&[ChatTurn]>,
    ) -> Result<String, AiLlmError> {
        let messages = build_messages(prompt, context, history);
        debug!(messages = messages.len(), context_len = context.len(), "generating answer");

        let result = self.chat.chat(&messages).await;
        self.record(&result);
        result
    }

    /// Generates an answer as a stream of text fragments.
    ///
    /// An error while opening the stream is returned directly; errors in the
    /// middle of the stream arrive as `Err` items.
    #[instrument(skip_all, fields(provider = self.chat_cfg.provider.as_str(), model = %self.chat_cfg.model))]
    pub async fn generate_response_stream(
        &self,
        prompt: &str,
        context: &str,
        history: Option<&[ChatTurn]>,
    ) -> Result<TextStream, AiLlmError> {
        let messages = build_messages(prompt, context, history);
        debug!(messages = messages.len(), context_len = context.len(), "opening answer stream");

        let stream = match self.chat.chat_stream(&messages).await {
            Ok(s) => s,
            Err(e) => {
                self.mark(false);
                return Err(e);
            }
        };
        self.mark(true);

        let flag = Arc::clone(&self.available);
        Ok(stream
            .inspect(move |item| {
                if let Err(e) = item {
                    warn!(error = %e, "answer stream failed");
                    flag.store(false, Ordering::Relaxed);
                }
            })
            .boxed())
    }

    /// Computes an embedding with the **embedding** profile.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if embedding fails.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let result = self.embedding.embeddings(input).await;
        self.record(&result);
        result
    }

    /// Whether the last backend call succeeded. Starts as `true`.
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }

    /// Returns a health snapshot for all distinct profiles.
    pub async fn health_all(&self) -> Vec<HealthStatus> {
        let mut list = Vec::<LlmModelConfig>::with_capacity(2);
        list.push(self.chat_cfg.clone());
        if self.embedding_cfg != self.chat_cfg {
            list.push(self.embedding_cfg.clone());
        }
        let statuses = self.health.check_many(&list).await;
        self.mark(statuses.iter().all(|s| s.ok));
        statuses
    }

    /// Returns references to the current profiles `(chat, embedding)`.
    pub fn profiles(&self) -> (&LlmModelConfig, &LlmModelConfig) {
        (&self.chat_cfg, &self.embedding_cfg)
    }

    fn record<T>(&self, result: &Result<T, AiLlmError>) {
        if let Err(e) = result {
            warn!(error = %e, "LLM call failed");
        }
        self.mark(result.is_ok());
    }

    fn mark(&self, ok: bool) {
        self.available.store(ok, Ordering::Relaxed);
    }
}
