mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};

use crate::vault::VaultProvider;

/// Used when neither `--config` nor `SIFT_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Pick the config file: explicit path, then `SIFT_CONFIG`, then the default.
#[must_use]
pub fn resolve_config_path(cli_arg: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_owned();
    }
    if let Ok(path) = std::env::var("SIFT_CONFIG")
        && !path.is_empty()
    {
        return PathBuf::from(path);
    }
    PathBuf::from(DEFAULT_CONFIG_PATH)
}

/// Load `.env` from the working directory into the process environment.
///
/// A missing file is not an error.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("ignoring malformed .env file: {e}"),
    }
}

impl Config {
    /// Load configuration from a TOML file with env var overrides, then validate.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or if
    /// the resulting configuration is invalid.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.retrieval.top_k == 0 {
            bail!("retrieval.top_k must be at least 1");
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            bail!(
                "llm.temperature must be within [0, 2], got {}",
                self.llm.temperature
            );
        }
        if self.llm.max_tokens == 0 {
            bail!("llm.max_tokens must be at least 1");
        }
        if self.llm.model.trim().is_empty() {
            bail!("llm.model must not be empty");
        }
        if self.embedding.model.trim().is_empty() {
            bail!("embedding.model must not be empty");
        }
        if self.embedding.dimensions == Some(0) {
            bail!("embedding.dimensions must be at least 1 when set");
        }
        if self.index.name.trim().is_empty() {
            bail!("index.name must not be empty");
        }
        if self.index.backend == IndexBackend::Qdrant && self.index.host.is_none() {
            bail!("index.host is required for the qdrant backend");
        }
        let t = &self.timeouts;
        for (name, secs) in [
            ("embedding_seconds", t.embedding_seconds),
            ("index_seconds", t.index_seconds),
            ("llm_seconds", t.llm_seconds),
            ("stream_idle_seconds", t.stream_idle_seconds),
        ] {
            if secs == 0 {
                bail!("timeouts.{name} must be at least 1");
            }
        }
        Ok(())
    }

    /// Resolve credentials through the vault.
    ///
    /// The completion key is `SIFT_LLM_API_KEY`, falling back to `GROQ_API_KEY`,
    /// then `OPENAI_API_KEY` for the `openai` provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault backend fails.
    pub async fn resolve_secrets(&mut self, vault: &dyn VaultProvider) -> anyhow::Result<()> {
        self.secrets.pinecone_api_key = vault.get_secret("PINECONE_API_KEY").await?;
        self.secrets.openai_api_key = vault.get_secret("OPENAI_API_KEY").await?;
        self.secrets.qdrant_api_key = vault.get_secret("QDRANT_API_KEY").await?;

        let llm_keys: &[&str] = if self.llm.provider == ProviderKind::OpenAi {
            &["SIFT_LLM_API_KEY", "GROQ_API_KEY", "OPENAI_API_KEY"]
        } else {
            &["SIFT_LLM_API_KEY", "GROQ_API_KEY"]
        };
        self.secrets.llm_api_key = vault.first_of(llm_keys).await?;
        Ok(())
    }
}

impl TimeoutConfig {
    #[must_use]
    pub fn embedding(&self) -> Duration {
        Duration::from_secs(self.embedding_seconds)
    }

    #[must_use]
    pub fn index(&self) -> Duration {
        Duration::from_secs(self.index_seconds)
    }

    #[must_use]
    pub fn llm(&self) -> Duration {
        Duration::from_secs(self.llm_seconds)
    }

    #[must_use]
    pub fn stream_idle(&self) -> Duration {
        Duration::from_secs(self.stream_idle_seconds)
    }
}
