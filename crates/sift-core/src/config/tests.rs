use std::collections::HashMap;
use std::io::Write;

use serial_test::serial;
use sift_index::BoxFuture;

use super::*;
use crate::vault::Secret;

const ENV_KEYS: [&str; 21] = [
    "SIFT_CONFIG",
    "SIFT_LLM_PROVIDER",
    "SIFT_LLM_NAME",
    "SIFT_LLM_BASE_URL",
    "SIFT_LLM_MODEL",
    "SIFT_LLM_TEMPERATURE",
    "SIFT_LLM_MAX_TOKENS",
    "SIFT_EMBEDDING_PROVIDER",
    "SIFT_EMBEDDING_BASE_URL",
    "SIFT_EMBEDDING_MODEL",
    "SIFT_EMBEDDING_DIMENSIONS",
    "SIFT_INDEX_BACKEND",
    "SIFT_INDEX_NAME",
    "SIFT_INDEX_HOST",
    "SIFT_INDEX_NAMESPACE",
    "SIFT_RETRIEVAL_TOP_K",
    "SIFT_TIMEOUT_EMBEDDING",
    "SIFT_TIMEOUT_INDEX",
    "SIFT_TIMEOUT_LLM",
    "SIFT_TIMEOUT_STREAM_IDLE",
    "SIFT_LLM_API_KEY",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

fn write_config(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("sift.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    write!(f, "{body}").unwrap();
    path
}

struct MapVault(HashMap<&'static str, &'static str>);

impl VaultProvider for MapVault {
    fn get_secret(&self, key: &str) -> BoxFuture<'_, anyhow::Result<Option<Secret>>> {
        let val = self.0.get(key).map(|v| Secret::new(*v));
        Box::pin(async move { Ok(val) })
    }
}

#[test]
fn defaults_match_reference_deployment() {
    let config = Config::default();
    assert_eq!(config.llm.provider, ProviderKind::Compatible);
    assert_eq!(config.llm.name, "groq");
    assert_eq!(config.llm.base_url, "https://api.groq.com/openai/v1");
    assert_eq!(config.llm.model, "llama3-8b-8192");
    assert!(config.llm.temperature.abs() < f32::EPSILON);
    assert_eq!(config.llm.max_tokens, 500);
    assert_eq!(config.embedding.provider, ProviderKind::Ollama);
    assert_eq!(config.embedding.model, "all-mpnet-base-v2");
    assert_eq!(config.embedding.dimensions, Some(768));
    assert_eq!(config.index.backend, IndexBackend::Pinecone);
    assert_eq!(config.index.name, "abstractive-question-answering");
    assert!(config.index.host.is_none());
    assert_eq!(config.retrieval.top_k, 5);
    assert_eq!(config.timeouts.llm_seconds, 120);
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn missing_file_falls_back_to_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.retrieval.top_k, 5);
}

#[test]
#[serial]
fn shipped_config_matches_defaults() {
    clear_env();
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/default.toml");
    let config = Config::load(&path).unwrap();
    let defaults = Config::default();
    assert_eq!(config.embedding.model, defaults.embedding.model);
    assert_eq!(config.embedding.dimensions, Some(768));
    assert_eq!(config.index.name, defaults.index.name);
}

#[test]
#[serial]
fn embedding_section_without_dimensions_keeps_index_width() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[embedding]\nmodel = \"all-mpnet-base-v2\"\n");
    let config = Config::load(&path).unwrap();
    assert_eq!(config.embedding.dimensions, Some(768));
}

#[test]
#[serial]
fn parse_valid_toml() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
[llm]
provider = "openai"
base_url = "https://api.openai.com/v1"
model = "gpt-4o-mini"
max_tokens = 300

[embedding]
provider = "openai"
model = "text-embedding-3-small"
dimensions = 1536

[index]
backend = "qdrant"
name = "docs"
host = "http://localhost:6334"

[retrieval]
top_k = 8

[timeouts]
stream_idle_seconds = 15
"#,
    );

    let config = Config::load(&path).unwrap();
    assert_eq!(config.llm.provider, ProviderKind::OpenAi);
    assert_eq!(config.llm.model, "gpt-4o-mini");
    assert_eq!(config.llm.max_tokens, 300);
    assert_eq!(config.embedding.dimensions, Some(1536));
    assert_eq!(config.index.backend, IndexBackend::Qdrant);
    assert_eq!(config.index.host.as_deref(), Some("http://localhost:6334"));
    assert_eq!(config.retrieval.top_k, 8);
    assert_eq!(config.timeouts.stream_idle_seconds, 15);
    assert_eq!(config.timeouts.llm_seconds, 120);
}

#[test]
#[serial]
fn malformed_toml_is_an_error() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[retrieval\ntop_k = ");
    let err = Config::load(&path).unwrap_err();
    assert!(err.to_string().contains("failed to parse config file"));
}

#[test]
#[serial]
fn env_overrides_file_values() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[retrieval]\ntop_k = 3\n");
    unsafe {
        std::env::set_var("SIFT_RETRIEVAL_TOP_K", "7");
        std::env::set_var("SIFT_LLM_PROVIDER", "Ollama");
        std::env::set_var("SIFT_LLM_MODEL", "llama3.2");
        std::env::set_var("SIFT_INDEX_BACKEND", "memory");
        std::env::set_var("SIFT_INDEX_HOST", "");
        std::env::set_var("SIFT_TIMEOUT_LLM", "45");
    }
    let config = Config::load(&path).unwrap();
    clear_env();

    assert_eq!(config.retrieval.top_k, 7);
    assert_eq!(config.llm.provider, ProviderKind::Ollama);
    assert_eq!(config.llm.model, "llama3.2");
    assert_eq!(config.index.backend, IndexBackend::Memory);
    assert!(config.index.host.is_none());
    assert_eq!(config.timeouts.llm_seconds, 45);
}

#[test]
#[serial]
fn invalid_env_values_are_ignored() {
    clear_env();
    unsafe {
        std::env::set_var("SIFT_LLM_PROVIDER", "bard");
        std::env::set_var("SIFT_RETRIEVAL_TOP_K", "many");
        std::env::set_var("SIFT_TIMEOUT_INDEX", "-1");
    }
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("absent.toml")).unwrap();
    clear_env();

    assert_eq!(config.llm.provider, ProviderKind::Compatible);
    assert_eq!(config.retrieval.top_k, 5);
    assert_eq!(config.timeouts.index_seconds, 30);
}

#[test]
#[serial]
fn zero_top_k_fails_validation() {
    clear_env();
    unsafe { std::env::set_var("SIFT_RETRIEVAL_TOP_K", "0") };
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(&dir.path().join("absent.toml")).unwrap_err();
    clear_env();
    assert!(err.to_string().contains("top_k"));
}

#[test]
fn validate_rejects_out_of_range_settings() {
    let mut config = Config::default();
    config.llm.temperature = 2.5;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.llm.max_tokens = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.timeouts.stream_idle_seconds = 0;
    assert!(
        config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("stream_idle_seconds")
    );

    let mut config = Config::default();
    config.embedding.model = "  ".into();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.index.backend = IndexBackend::Qdrant;
    assert!(config.validate().is_err());
    config.index.host = Some("http://localhost:6334".into());
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn config_path_resolution_order() {
    clear_env();
    let explicit = std::path::Path::new("/tmp/explicit.toml");
    assert_eq!(resolve_config_path(Some(explicit)), explicit);
    assert_eq!(
        resolve_config_path(None),
        std::path::PathBuf::from(DEFAULT_CONFIG_PATH)
    );
    unsafe { std::env::set_var("SIFT_CONFIG", "/etc/sift.toml") };
    assert_eq!(
        resolve_config_path(None),
        std::path::PathBuf::from("/etc/sift.toml")
    );
    clear_env();
}

#[tokio::test]
async fn secrets_prefer_sift_key_over_groq() {
    let vault = MapVault(HashMap::from([
        ("SIFT_LLM_API_KEY", "sift-key"),
        ("GROQ_API_KEY", "gsk-key"),
        ("PINECONE_API_KEY", "pc-key"),
    ]));
    let mut config = Config::default();
    config.resolve_secrets(&vault).await.unwrap();
    assert_eq!(
        config.secrets.llm_api_key.as_ref().map(Secret::expose),
        Some("sift-key")
    );
    assert_eq!(
        config.secrets.pinecone_api_key.as_ref().map(Secret::expose),
        Some("pc-key")
    );
    assert!(config.secrets.qdrant_api_key.is_none());
}

#[tokio::test]
async fn groq_key_is_used_when_no_sift_key() {
    let vault = MapVault(HashMap::from([("GROQ_API_KEY", "gsk-key")]));
    let mut config = Config::default();
    config.resolve_secrets(&vault).await.unwrap();
    assert_eq!(
        config.secrets.llm_api_key.as_ref().map(Secret::expose),
        Some("gsk-key")
    );
}

#[tokio::test]
async fn openai_provider_falls_back_to_openai_key() {
    let vault = MapVault(HashMap::from([("OPENAI_API_KEY", "sk-key")]));
    let mut config = Config::default();
    config.llm.provider = ProviderKind::OpenAi;
    config.resolve_secrets(&vault).await.unwrap();
    assert_eq!(
        config.secrets.llm_api_key.as_ref().map(Secret::expose),
        Some("sk-key")
    );
}

#[test]
fn secrets_are_not_serialized() {
    let mut config = Config::default();
    config.secrets.pinecone_api_key = Some(Secret::new("pc-key"));
    let toml = toml::to_string(&config).unwrap();
    assert!(!toml.contains("pc-key"));
    assert!(toml.contains("abstractive-question-answering"));
}
