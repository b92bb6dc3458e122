use serde::{Deserialize, Serialize};

use crate::vault::Secret;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(skip)]
    pub secrets: ResolvedSecrets,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    #[default]
    Compatible,
    Ollama,
}

impl ProviderKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Compatible => "compatible",
            Self::Ollama => "ollama",
        }
    }
}

/// Completion model used for answers.
#[derive(Debug, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    /// Display name of a compatible provider, also used in logs.
    #[serde(default = "default_llm_name")]
    pub name: String,
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_llm_name() -> String {
    "groq".into()
}

fn default_llm_base_url() -> String {
    sift_llm::compatible::GROQ_BASE_URL.into()
}

fn default_llm_model() -> String {
    "llama3-8b-8192".into()
}

fn default_max_tokens() -> u32 {
    500
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            name: default_llm_name(),
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
        }
    }
}

/// Embedding model; must match the one the index was built with.
#[derive(Debug, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: ProviderKind,
    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Expected vector length. Set to `None` to skip the check.
    #[serde(
        default = "default_embedding_dimensions",
        skip_serializing_if = "Option::is_none"
    )]
    pub dimensions: Option<usize>,
}

fn default_embedding_provider() -> ProviderKind {
    ProviderKind::Ollama
}

fn default_embedding_base_url() -> String {
    "http://localhost:11434".into()
}

fn default_embedding_model() -> String {
    "all-mpnet-base-v2".into()
}

#[allow(clippy::unnecessary_wraps)]
fn default_embedding_dimensions() -> Option<usize> {
    Some(768)
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            base_url: default_embedding_base_url(),
            model: default_embedding_model(),
            dimensions: default_embedding_dimensions(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    #[default]
    Pinecone,
    Qdrant,
    Memory,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub backend: IndexBackend,
    /// Pinecone index or Qdrant collection name.
    #[serde(default = "default_index_name")]
    pub name: String,
    /// Pinecone data-plane host or Qdrant URL. Pinecone resolves it from
    /// `name` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

fn default_index_name() -> String {
    "abstractive-question-answering".into()
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            backend: IndexBackend::default(),
            name: default_index_name(),
            host: None,
            namespace: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    5
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_embedding_timeout")]
    pub embedding_seconds: u64,
    #[serde(default = "default_index_timeout")]
    pub index_seconds: u64,
    #[serde(default = "default_llm_timeout")]
    pub llm_seconds: u64,
    #[serde(default = "default_stream_idle_timeout")]
    pub stream_idle_seconds: u64,
}

fn default_embedding_timeout() -> u64 {
    30
}

fn default_index_timeout() -> u64 {
    30
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_stream_idle_timeout() -> u64 {
    60
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            embedding_seconds: default_embedding_timeout(),
            index_seconds: default_index_timeout(),
            llm_seconds: default_llm_timeout(),
            stream_idle_seconds: default_stream_idle_timeout(),
        }
    }
}

/// Credentials resolved at startup. Never serialized.
#[derive(Debug, Default)]
pub struct ResolvedSecrets {
    pub pinecone_api_key: Option<Secret>,
    pub llm_api_key: Option<Secret>,
    pub openai_api_key: Option<Secret>,
    pub qdrant_api_key: Option<Secret>,
}
