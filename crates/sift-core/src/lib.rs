//! Retrieval-augmented query pipeline, prompt context builder, and configuration.

pub mod config;
pub mod context;
pub mod embedder;
pub mod error;
pub mod expander;
pub mod pipeline;
pub mod query;
pub mod retriever;
pub mod synthesizer;
pub mod vault;

pub use context::{ContextBuilder, PromptContext};
pub use embedder::Embedder;
pub use error::{PipelineError, ServiceError, Stage};
pub use expander::{ExpansionResult, PassageExpander};
pub use pipeline::{Pipeline, QueryOutcome};
pub use query::{MatchSet, Passage, Query};
pub use retriever::Retriever;
pub use synthesizer::{Answer, AnswerStream, AnswerSynthesizer};
