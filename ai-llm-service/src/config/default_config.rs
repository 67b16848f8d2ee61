//! Default LLM configs loaded strictly from environment variables.
//!
//! Two roles are supported, both served by the backend selected in `LLM_KIND`:
//!
//! - **Chat**      → answers questions (sync and streaming)
//! - **Embedding** → turns queries into vectors for retrieval
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_KIND`         = `ollama` (default) or `openai`
//! - `LLM_MAX_TOKENS`   = optional max tokens (u32)
//! - `LLM_TEMPERATURE`  = optional chat temperature (`0.0..=2.0`, default `0.3`)
//! - `LLM_TIMEOUT_SECS` = optional chat timeout (default `120`)
//! - `EMBEDDING_MODEL`  = embedding model (mandatory)
//!
//! Ollama-specific:
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (mandatory)
//! - `OLLAMA_MODEL`                = chat model (mandatory)
//!
//! OpenAI-specific:
//! - `OPENAI_API_KEY` = API key (mandatory)
//! - `OPENAI_URL`     = base URL (default `https://api.openai.com`)
//! - `OPENAI_MODEL`   = chat model (default `gpt-4o-mini`)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, env_opt, env_opt_f32, env_opt_u32, env_opt_u64, must_env,
        validate_http_endpoint, validate_range_f32,
    },
};

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_CHAT_TEMPERATURE: f32 = 0.3;
const DEFAULT_CHAT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_EMBEDDING_TIMEOUT_SECS: u64 = 30;

/// Reads `LLM_KIND` (defaults to Ollama when unset).
///
/// # Errors
/// [`ConfigError::UnsupportedProvider`] for unknown values.
pub fn provider_from_env() -> Result<LlmProvider, AiLlmError> {
    match env_opt("LLM_KIND") {
        Some(kind) => Ok(kind.parse::<LlmProvider>()?),
        None => Ok(LlmProvider::Ollama),
    }
}

/// Resolves the Ollama endpoint strictly from environment.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
fn ollama_endpoint() -> Result<String, AiLlmError> {
    if let Some(url) = env_opt("OLLAMA_URL") {
        validate_http_endpoint("OLLAMA_URL", &url)?;
        return Ok(url);
    }
    if let Some(port) = env_opt("OLLAMA_PORT") {
        port.trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidNumber {
                var: "OLLAMA_PORT",
                reason: "expected u16 (1..=65535)",
            })?;
        return Ok(format!("http://localhost:{}", port.trim()));
    }
    Err(AiLlmError::Config(ConfigError::MissingVar(
        "OLLAMA_URL or OLLAMA_PORT",
    )))
}

fn openai_endpoint() -> Result<String, AiLlmError> {
    let url = env_opt("OPENAI_URL").unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string());
    validate_http_endpoint("OPENAI_URL", &url)?;
    Ok(url)
}

/// Constructs the **chat** profile used to answer questions.
///
/// # Defaults
/// - `temperature = Some(0.3)` unless `LLM_TEMPERATURE` is set
/// - `timeout_secs = Some(120)` unless `LLM_TIMEOUT_SECS` is set
pub fn config_chat() -> Result<LlmModelConfig, AiLlmError> {
    let provider = provider_from_env()?;
    let max_tokens = env_opt_u32("LLM_MAX_TOKENS")?;
    let temperature = env_opt_f32("LLM_TEMPERATURE")?.unwrap_or(DEFAULT_CHAT_TEMPERATURE);
    validate_range_f32("temperature", temperature, 0.0, 2.0)?;
    let timeout_secs = env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_CHAT_TIMEOUT_SECS);

    let (endpoint, model, api_key) = match provider {
        LlmProvider::Ollama => (ollama_endpoint()?, must_env("OLLAMA_MODEL")?, None),
        LlmProvider::OpenAI => (
            openai_endpoint()?,
            env_opt("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            Some(must_env("OPENAI_API_KEY")?),
        ),
    };

    Ok(LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens,
        temperature: Some(temperature),
        top_p: None,
        timeout_secs: Some(timeout_secs),
    })
}

/// Constructs the **embedding** profile used to vectorize queries.
///
/// # Defaults
/// - `temperature = Some(0.0)` (deterministic)
/// - `max_tokens = None`
/// - `timeout_secs = Some(30)`
pub fn config_embedding() -> Result<LlmModelConfig, AiLlmError> {
    let provider = provider_from_env()?;
    let model = must_env("EMBEDDING_MODEL")?;

    let (endpoint, api_key) = match provider {
        LlmProvider::Ollama => (ollama_endpoint()?, None),
        LlmProvider::OpenAI => (openai_endpoint()?, Some(must_env("OPENAI_API_KEY")?)),
    };

    Ok(LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens: None,
        temperature: Some(0.0),
        top_p: None,
        timeout_secs: Some(DEFAULT_EMBEDDING_TIMEOUT_SECS),
    })
}
