//! Query orchestration: retrieval, then prompt building and synthesis on demand.

use std::sync::Arc;

use sift_index::VectorIndex;
use sift_llm::LlmProvider;

use crate::config::Config;
use crate::context::ContextBuilder;
use crate::embedder::Embedder;
use crate::error::PipelineError;
use crate::expander::{ExpansionResult, PassageExpander};
use crate::query::{MatchSet, Query};
use crate::retriever::Retriever;
use crate::synthesizer::{AnswerStream, AnswerSynthesizer};

/// Result of one [`Pipeline::answer_query`] call.
#[derive(Debug)]
pub struct QueryOutcome {
    pub matches: MatchSet,
    /// Present only when an answer was requested.
    pub answer: Option<AnswerStream>,
}

/// Holds the process-wide service handles; each call is independent.
///
/// `E` embeds queries, `C` generates answers. Both may be the same provider.
pub struct Pipeline<E, C> {
    retriever: Retriever<E>,
    context: ContextBuilder,
    synthesizer: AnswerSynthesizer<C>,
    expander: PassageExpander,
}

impl<E, C> Clone for Pipeline<E, C> {
    fn clone(&self) -> Self {
        Self {
            retriever: self.retriever.clone(),
            context: self.context,
            synthesizer: self.synthesizer.clone(),
            expander: self.expander.clone(),
        }
    }
}

impl<E: LlmProvider, C: LlmProvider> Pipeline<E, C> {
    #[must_use]
    pub fn new(
        retriever: Retriever<E>,
        synthesizer: AnswerSynthesizer<C>,
        expander: PassageExpander,
    ) -> Self {
        Self {
            retriever,
            context: ContextBuilder::new(),
            synthesizer,
            expander,
        }
    }

    /// Wire the components with the timeouts and dimensionality from `config`.
    #[must_use]
    pub fn from_config(
        config: &Config,
        embedding: Arc<E>,
        completion: Arc<C>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        let timeouts = &config.timeouts;
        let embedder = Embedder::new(embedding)
            .with_timeout(timeouts.embedding())
            .with_dimensions(config.embedding.dimensions);
        let retriever =
            Retriever::new(embedder, Arc::clone(&index)).with_timeout(timeouts.index());
        let synthesizer = AnswerSynthesizer::new(completion)
            .with_timeout(timeouts.llm())
            .with_idle_timeout(timeouts.stream_idle());
        let expander = PassageExpander::new(index).with_timeout(timeouts.index());
        Self::new(retriever, synthesizer, expander)
    }

    /// Retrieve matches for `query` and, if `generate_answer`, start an answer.
    ///
    /// Retrieval failures abort the call. A synthesis failure does not: the
    /// matches are returned and the answer stream yields the error.
    ///
    /// # Errors
    ///
    /// [`PipelineError::InvalidQuery`] or [`PipelineError::RetrievalUnavailable`].
    pub async fn answer_query(
        &self,
        query: &Query,
        generate_answer: bool,
    ) -> Result<QueryOutcome, PipelineError> {
        let matches = self.retriever.retrieve(query).await?;

        if !generate_answer {
            return Ok(QueryOutcome {
                matches,
                answer: None,
            });
        }

        let prompt = self.context.build(query.text(), &matches);
        let answer = match self.synthesizer.synthesize(&prompt).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!("answer synthesis failed: {e}");
                AnswerStream::failed(e)
            }
        };
        Ok(QueryOutcome {
            matches,
            answer: Some(answer),
        })
    }

    /// Fetch the passage following `passage_id`.
    ///
    /// # Errors
    ///
    /// See [`PassageExpander::expand`].
    pub async fn expand(&self, passage_id: &str) -> Result<ExpansionResult, PipelineError> {
        self.expander.expand(passage_id).await
    }
}
