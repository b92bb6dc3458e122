use std::sync::Arc;
use std::time::{Duration, Instant};

use sift_index::VectorIndex;
use sift_llm::LlmProvider;

use crate::embedder::Embedder;
use crate::error::{PipelineError, ServiceError, Stage};
use crate::query::{MatchSet, Passage, Query};

/// Embeds a query and runs a top-k similarity search.
///
/// The index enforces the source filter and the ranking; results are returned
/// in index order without local re-filtering or re-sorting.
pub struct Retriever<P> {
    embedder: Embedder<P>,
    index: Arc<dyn VectorIndex>,
    timeout: Duration,
}

impl<P> Clone for Retriever<P> {
    fn clone(&self) -> Self {
        Self {
            embedder: self.embedder.clone(),
            index: Arc::clone(&self.index),
            timeout: self.timeout,
        }
    }
}

impl<P: LlmProvider> Retriever<P> {
    #[must_use]
    pub fn new(embedder: Embedder<P>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            embedder,
            index,
            timeout: Duration::from_secs(30),
        }
    }

    /// Bound on the index query call.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// # Errors
    ///
    /// [`PipelineError::InvalidQuery`] for blank text or zero `top_k`;
    /// [`PipelineError::RetrievalUnavailable`] if embedding or search fails.
    pub async fn retrieve(&self, query: &Query) -> Result<MatchSet, PipelineError> {
        query.validate()?;
        let started = Instant::now();

        let vector = self
            .embedder
            .encode(query.text())
            .await
            .map_err(PipelineError::RetrievalUnavailable)?;

        let top_k = query.top_k();
        let points = tokio::time::timeout(
            self.timeout,
            self.index.query(
                vector,
                u64::try_from(top_k).unwrap_or(u64::MAX),
                query.index_filter(),
            ),
        )
        .await
        .map_err(|_| {
            PipelineError::RetrievalUnavailable(ServiceError::Timeout {
                stage: Stage::Index,
                after: self.timeout,
            })
        })?
        .map_err(|e| PipelineError::RetrievalUnavailable(e.into()))?;

        let mut passages: Vec<Passage> = points.into_iter().map(Passage::from).collect();
        if passages.len() > top_k {
            tracing::warn!(
                backend = self.index.backend(),
                returned = passages.len(),
                top_k,
                "index returned more matches than requested, truncating"
            );
            passages.truncate(top_k);
        }

        tracing::info!(
            backend = self.index.backend(),
            top_k,
            sources = query.source_filter().len(),
            matches = passages.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "retrieval complete"
        );
        Ok(MatchSet::new(passages))
    }
}
