//! Credential lookup. Secrets never reach the config file or the logs.

use std::fmt;

use serde::Deserialize;
use sift_index::BoxFuture;

/// An API key. Formatting prints a placeholder; use [`Secret::expose`] at the
/// point of use.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Where credentials come from.
pub trait VaultProvider: Send + Sync {
    /// Look up one named credential. `Ok(None)` means it is not set.
    fn get_secret(&self, key: &str) -> BoxFuture<'_, anyhow::Result<Option<Secret>>>;

    /// The first of `keys` that is set, in order.
    fn first_of<'a>(
        &'a self,
        keys: &'a [&'a str],
    ) -> BoxFuture<'a, anyhow::Result<Option<Secret>>> {
        Box::pin(async move {
            for key in keys {
                if let Some(secret) = self.get_secret(key).await? {
                    tracing::debug!(key, "credential resolved");
                    return Ok(Some(secret));
                }
            }
            Ok(None)
        })
    }
}

/// Credentials from the process environment (after `.env` loading).
/// Blank values count as unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvVaultProvider;

impl VaultProvider for EnvVaultProvider {
    fn get_secret(&self, key: &str) -> BoxFuture<'_, anyhow::Result<Option<Secret>>> {
        let value = std::env::var(key)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(Secret::new);
        Box::pin(async move { Ok(value) })
    }
}
