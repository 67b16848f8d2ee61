use std::sync::Arc;

use ai_llm_service::{LlmService, telemetry};
use anyhow::Context;
use api::{AppState, BackendHealth};
use assistant_core::{AssistantConfig, QueryProcessor};
use rag_store::{LlmEmbedder, RagConfig, RagStore};
use tracing::{Level, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the process environment may carry everything.
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e).context("failed to read .env");
        }
    }

    tracing_subscriber::registry()
        .with(telemetry::env_filter_with_level("info", Level::INFO))
        .with(telemetry::layer())
        .init();

    let llm = Arc::new(LlmService::from_env().context("LLM configuration")?);
    let rag_cfg = RagConfig::from_env().context("vector store configuration")?;
    let embedder = Arc::new(LlmEmbedder::new(llm.clone(), rag_cfg.embedding_dim));
    let store = Arc::new(RagStore::new(rag_cfg, embedder).context("vector store client")?);
    let cfg = AssistantConfig::from_env().context("assistant configuration")?;

    info!(max_context_docs = cfg.max_context_docs, "starting appointment assistant");

    let processor = QueryProcessor::new(store.clone(), llm.clone(), cfg);
    let state = AppState::new(processor, Arc::new(BackendHealth::new(llm, store)));

    api::start(state).await?;
    Ok(())
}
