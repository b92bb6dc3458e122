use super::{Config, IndexBackend, ProviderKind};

fn parse_kind<T: serde::de::DeserializeOwned>(var: &str, value: &str) -> Option<T> {
    let parsed = serde_json::from_value(serde_json::Value::String(value.to_lowercase())).ok();
    if parsed.is_none() {
        tracing::warn!("ignoring invalid {var} value: {value}");
    }
    parsed
}

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_llm();
        self.apply_env_overrides_index();
        self.apply_env_overrides_timeouts();
    }

    fn apply_env_overrides_llm(&mut self) {
        if let Ok(v) = std::env::var("SIFT_LLM_PROVIDER")
            && let Some(kind) = parse_kind::<ProviderKind>("SIFT_LLM_PROVIDER", &v)
        {
            self.llm.provider = kind;
        }
        if let Ok(v) = std::env::var("SIFT_LLM_NAME") {
            self.llm.name = v;
        }
        if let Ok(v) = std::env::var("SIFT_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("SIFT_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("SIFT_LLM_TEMPERATURE") {
            match v.parse::<f32>() {
                Ok(t) => self.llm.temperature = t,
                Err(_) => tracing::warn!("ignoring invalid SIFT_LLM_TEMPERATURE value: {v}"),
            }
        }
        if let Ok(v) = std::env::var("SIFT_LLM_MAX_TOKENS") {
            match v.parse::<u32>() {
                Ok(n) => self.llm.max_tokens = n,
                Err(_) => tracing::warn!("ignoring invalid SIFT_LLM_MAX_TOKENS value: {v}"),
            }
        }
        if let Ok(v) = std::env::var("SIFT_EMBEDDING_PROVIDER")
            && let Some(kind) = parse_kind::<ProviderKind>("SIFT_EMBEDDING_PROVIDER", &v)
        {
            self.embedding.provider = kind;
        }
        if let Ok(v) = std::env::var("SIFT_EMBEDDING_BASE_URL") {
            self.embedding.base_url = v;
        }
        if let Ok(v) = std::env::var("SIFT_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Ok(v) = std::env::var("SIFT_EMBEDDING_DIMENSIONS")
            && let Ok(n) = v.parse::<usize>()
        {
            self.embedding.dimensions = Some(n);
        }
    }

    fn apply_env_overrides_index(&mut self) {
        if let Ok(v) = std::env::var("SIFT_INDEX_BACKEND")
            && let Some(backend) = parse_kind::<IndexBackend>("SIFT_INDEX_BACKEND", &v)
        {
            self.index.backend = backend;
        }
        if let Ok(v) = std::env::var("SIFT_INDEX_NAME") {
            self.index.name = v;
        }
        if let Ok(v) = std::env::var("SIFT_INDEX_HOST") {
            self.index.host = Some(v).filter(|h| !h.is_empty());
        }
        if let Ok(v) = std::env::var("SIFT_INDEX_NAMESPACE") {
            self.index.namespace = Some(v).filter(|ns| !ns.is_empty());
        }
        if let Ok(v) = std::env::var("SIFT_RETRIEVAL_TOP_K") {
            match v.parse::<usize>() {
                Ok(k) => self.retrieval.top_k = k,
                Err(_) => tracing::warn!("ignoring invalid SIFT_RETRIEVAL_TOP_K value: {v}"),
            }
        }
    }

    fn apply_env_overrides_timeouts(&mut self) {
        if let Ok(v) = std::env::var("SIFT_TIMEOUT_EMBEDDING")
            && let Ok(secs) = v.parse::<u64>()
        {
            self.timeouts.embedding_seconds = secs;
        }
        if let Ok(v) = std::env::var("SIFT_TIMEOUT_INDEX")
            && let Ok(secs) = v.parse::<u64>()
        {
            self.timeouts.index_seconds = secs;
        }
        if let Ok(v) = std::env::var("SIFT_TIMEOUT_LLM")
            && let Ok(secs) = v.parse::<u64>()
        {
            self.timeouts.llm_seconds = secs;
        }
        if let Ok(v) = std::env::var("SIFT_TIMEOUT_STREAM_IDLE")
            && let Ok(secs) = v.parse::<u64>()
        {
            self.timeouts.stream_idle_seconds = secs;
        }
    }
}
