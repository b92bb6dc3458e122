use std::sync::Arc;
use std::time::{Duration, Instant};

use sift_llm::LlmProvider;

use crate::error::{ServiceError, Stage};

/// Text-to-vector encoder shared read-only across requests.
#[derive(Debug)]
pub struct Embedder<P> {
    provider: Arc<P>,
    timeout: Duration,
    dimensions: Option<usize>,
}

impl<P> Clone for Embedder<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            timeout: self.timeout,
            dimensions: self.dimensions,
        }
    }
}

impl<P: LlmProvider> Embedder<P> {
    #[must_use]
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            timeout: Duration::from_secs(30),
            dimensions: None,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reject vectors whose length differs from the index dimensionality.
    #[must_use]
    pub fn with_dimensions(mut self, dimensions: Option<usize>) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Encode `text` as a single vector.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] if the provider fails, times out, or returns
    /// a vector of the wrong dimensionality.
    pub async fn encode(&self, text: &str) -> Result<Vec<f32>, ServiceError> {
        let started = Instant::now();
        let vector = tokio::time::timeout(self.timeout, self.provider.embed(text))
            .await
            .map_err(|_| ServiceError::Timeout {
                stage: Stage::Embedding,
                after: self.timeout,
            })??;

        if let Some(expected) = self.dimensions
            && vector.len() != expected
        {
            return Err(ServiceError::Dimension {
                expected,
                actual: vector.len(),
            });
        }

        tracing::debug!(
            provider = self.provider.name(),
            dimensions = vector.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "query embedded"
        );
        Ok(vector)
    }
}
