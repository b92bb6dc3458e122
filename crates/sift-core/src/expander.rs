//! "Show more": the passage indexed right after a given one.
//!
//! Ids are assumed to be contiguous integers in document order, assigned at
//! ingestion. That scheme is a precondition of the index and is not checked.
//! Which integers are valid ids is up to the backend; one it rejects counts as
//! absent.

use std::sync::Arc;
use std::time::Duration;

use sift_index::{IndexError, VectorIndex};

use crate::error::{PipelineError, ServiceError, Stage};
use crate::query::CONTENT_FIELD;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionResult {
    /// The passage that was expanded.
    pub passage_id: String,
    /// Text of the following passage. `None` when it carries no content field.
    pub expanded_content: Option<String>,
}

#[derive(Clone)]
pub struct PassageExpander {
    index: Arc<dyn VectorIndex>,
    timeout: Duration,
}

impl PassageExpander {
    #[must_use]
    pub fn new(index: Arc<dyn VectorIndex>) -> Self {
        Self {
            index,
            timeout: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetch the passage whose id is `passage_id + 1`.
    ///
    /// # Errors
    ///
    /// [`PipelineError::ExpansionNotFound`] if `passage_id` is not an integer or
    /// the next id is absent or not a valid id for the backend;
    /// [`PipelineError::RetrievalUnavailable`] if the index call fails.
    pub async fn expand(&self, passage_id: &str) -> Result<ExpansionResult, PipelineError> {
        let not_found = || PipelineError::ExpansionNotFound {
            passage_id: passage_id.to_owned(),
        };
        let neighbor = next_id(passage_id).ok_or_else(not_found)?;

        let fetched = tokio::time::timeout(self.timeout, self.index.fetch(vec![neighbor.clone()]))
            .await
            .map_err(|_| {
                PipelineError::RetrievalUnavailable(ServiceError::Timeout {
                    stage: Stage::Index,
                    after: self.timeout,
                })
            })?;
        let mut fetched = match fetched {
            Ok(points) => points,
            Err(IndexError::InvalidId(id)) => {
                tracing::debug!(passage_id, neighbor = %id, "neighbor id rejected by index");
                return Err(not_found());
            }
            Err(e) => return Err(PipelineError::RetrievalUnavailable(e.into())),
        };

        let Some(point) = fetched.remove(&neighbor) else {
            tracing::debug!(passage_id, neighbor = %neighbor, "no neighbor passage");
            return Err(not_found());
        };

        Ok(ExpansionResult {
            passage_id: passage_id.to_owned(),
            expanded_content: point.text(CONTENT_FIELD).map(str::to_owned),
        })
    }
}

fn next_id(passage_id: &str) -> Option<String> {
    let n: i128 = passage_id.trim().parse().ok()?;
    n.checked_add(1).map(|next| next.to_string())
}
