//! Completion and embedding provider abstraction and backend implementations.

pub mod any;
pub mod compatible;
pub mod error;
pub(crate) mod http;
#[cfg(feature = "mock")]
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod provider;
pub(crate) mod retry;
pub(crate) mod sse;

pub use error::LlmError;
pub use provider::{ChatStream, LlmProvider, Message, Role, SamplingConfig};
