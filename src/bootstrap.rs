//! Construction of the process-wide provider and index handles from config.

use std::sync::Arc;

use anyhow::Context;
use sift_core::config::{Config, IndexBackend, ProviderKind};
use sift_index::{InMemoryIndex, PineconeIndex, QdrantIndex, VectorIndex};
use sift_llm::any::AnyProvider;
use sift_llm::compatible::CompatibleProvider;
use sift_llm::ollama::OllamaProvider;
use sift_llm::openai::OpenAiProvider;
use sift_llm::SamplingConfig;

fn llm_api_key(config: &Config) -> anyhow::Result<String> {
    Ok(config
        .secrets
        .llm_api_key
        .as_ref()
        .context("SIFT_LLM_API_KEY or GROQ_API_KEY not found in vault")?
        .expose()
        .to_owned())
}

/// Completion provider used for answers.
///
/// # Errors
///
/// Returns an error if a hosted provider has no API key.
pub fn create_completion_provider(config: &Config) -> anyhow::Result<AnyProvider> {
    let llm = &config.llm;
    let sampling = SamplingConfig {
        temperature: llm.temperature,
        max_tokens: llm.max_tokens,
    };
    let provider = match llm.provider {
        ProviderKind::Compatible => AnyProvider::Compatible(
            CompatibleProvider::new(
                llm.name.clone(),
                llm_api_key(config)?,
                llm.base_url.clone(),
                llm.model.clone(),
                None,
            )
            .with_sampling(sampling),
        ),
        ProviderKind::OpenAi => AnyProvider::OpenAi(
            OpenAiProvider::new(
                llm_api_key(config)?,
                llm.base_url.clone(),
                llm.model.clone(),
                None,
            )
            .with_sampling(sampling),
        ),
        ProviderKind::Ollama => AnyProvider::Ollama(
            OllamaProvider::new(&llm.base_url, llm.model.clone(), String::new())
                .with_sampling(sampling),
        ),
    };
    tracing::debug!(provider = llm.provider.as_str(), model = %llm.model, "completion provider ready");
    Ok(provider)
}

/// Embedding provider; must be the model the index was built with.
///
/// # Errors
///
/// Returns an error if a hosted provider has no API key.
pub fn create_embedding_provider(config: &Config) -> anyhow::Result<AnyProvider> {
    let emb = &config.embedding;
    let provider = match emb.provider {
        ProviderKind::Ollama => AnyProvider::Ollama(OllamaProvider::new(
            &emb.base_url,
            String::new(),
            emb.model.clone(),
        )),
        ProviderKind::OpenAi => {
            let api_key = config
                .secrets
                .openai_api_key
                .as_ref()
                .context("OPENAI_API_KEY not found in vault")?
                .expose()
                .to_owned();
            AnyProvider::OpenAi(OpenAiProvider::new(
                api_key,
                emb.base_url.clone(),
                String::new(),
                Some(emb.model.clone()),
            ))
        }
        ProviderKind::Compatible => AnyProvider::Compatible(CompatibleProvider::new(
            config.llm.name.clone(),
            llm_api_key(config)?,
            emb.base_url.clone(),
            String::new(),
            Some(emb.model.clone()),
        )),
    };
    tracing::debug!(provider = emb.provider.as_str(), model = %emb.model, "embedding provider ready");
    Ok(provider)
}

/// Vector index handle shared by retrieval and expansion.
///
/// # Errors
///
/// Returns an error if credentials are missing or the index cannot be located.
pub async fn create_index(config: &Config) -> anyhow::Result<Arc<dyn VectorIndex>> {
    let cfg = &config.index;
    let index: Arc<dyn VectorIndex> = match cfg.backend {
        IndexBackend::Pinecone => {
            let api_key = config
                .secrets
                .pinecone_api_key
                .as_ref()
                .context("PINECONE_API_KEY not found in vault")?
                .expose()
                .to_owned();
            let index = match &cfg.host {
                Some(host) => PineconeIndex::new(api_key, host)?,
                None => PineconeIndex::connect(api_key, &cfg.name)
                    .await
                    .with_context(|| format!("failed to locate Pinecone index {}", cfg.name))?,
            };
            Arc::new(index.with_namespace(cfg.namespace.clone()))
        }
        IndexBackend::Qdrant => {
            let url = cfg
                .host
                .as_deref()
                .context("index.host is required for the qdrant backend")?;
            let api_key = config
                .secrets
                .qdrant_api_key
                .as_ref()
                .map(|k| k.expose().to_owned());
            Arc::new(QdrantIndex::new(url, api_key, cfg.name.clone())?)
        }
        IndexBackend::Memory => {
            tracing::warn!("using an empty in-memory index; every query returns no matches");
            Arc::new(InMemoryIndex::new())
        }
    };
    tracing::info!(backend = index.backend(), name = %cfg.name, "vector index ready");
    Ok(index)
}
