//! Error types for sift-index.

/// Errors returned by vector index backends.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Transport-level failure talking to a REST backend.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("{backend} request failed (status {status})")]
    Status { backend: &'static str, status: u16 },

    /// Qdrant client error.
    #[error("Qdrant error: {0}")]
    Qdrant(#[from] Box<qdrant_client::QdrantError>),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed backend URL.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Point id the backend cannot represent.
    #[error("invalid point id: {0}")]
    InvalidId(String),

    /// Generic catch-all error.
    #[error("{0}")]
    Other(String),
}

/// Result type alias using `IndexError`.
pub type Result<T> = std::result::Result<T, IndexError>;
