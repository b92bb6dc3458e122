use std::fmt;
use std::time::Duration;

use sift_index::IndexError;
use sift_llm::LlmError;

/// External call a timeout applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Embedding,
    Index,
    Completion,
    /// Waiting for the next answer fragment.
    Stream,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Embedding => "embedding",
            Self::Index => "index",
            Self::Completion => "completion",
            Self::Stream => "answer stream",
        })
    }
}

/// Underlying cause of an unavailable service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("{stage} call timed out after {}s", after.as_secs())]
    Timeout { stage: Stage, after: Duration },

    #[error("embedding has {actual} dimensions, index expects {expected}")]
    Dimension { expected: usize, actual: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Caller input the pipeline refuses; not retryable.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("search unavailable: {0}")]
    RetrievalUnavailable(#[source] ServiceError),

    #[error("answer generation unavailable: {0}")]
    SynthesisUnavailable(#[source] ServiceError),

    /// No neighbor passage; callers show "no additional content".
    #[error("no additional content for passage {passage_id}")]
    ExpansionNotFound { passage_id: String },
}

impl PipelineError {
    /// Whether retrying the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RetrievalUnavailable(_) | Self::SynthesisUnavailable(_)
        )
    }

    /// The underlying service failure, if any.
    #[must_use]
    pub fn service_error(&self) -> Option<&ServiceError> {
        match self {
            Self::RetrievalUnavailable(e) | Self::SynthesisUnavailable(e) => Some(e),
            Self::InvalidQuery(_) | Self::ExpansionNotFound { .. } => None,
        }
    }
}
