//! Streamed answer generation.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use futures::{Stream, StreamExt};
use sift_llm::{ChatStream, LlmProvider, Message};

use crate::context::PromptContext;
use crate::error::{PipelineError, ServiceError, Stage};

type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, PipelineError>> + Send>>;

/// Forward-only sequence of answer fragments.
///
/// Fragments are pulled from the completion service on demand. After the first
/// error the stream ends. Dropping it closes the underlying request.
pub struct AnswerStream {
    inner: FragmentStream,
}

impl std::fmt::Debug for AnswerStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerStream").finish_non_exhaustive()
    }
}

impl AnswerStream {
    fn from_chat(stream: ChatStream, idle: Duration) -> Self {
        let inner = futures::stream::unfold(Some(stream), move |state| async move {
            let mut stream = state?;
            match tokio::time::timeout(idle, stream.next()).await {
                Ok(Some(Ok(fragment))) => Some((Ok(fragment), Some(stream))),
                Ok(Some(Err(e))) => Some((
                    Err(PipelineError::SynthesisUnavailable(e.into())),
                    None,
                )),
                Ok(None) => None,
                Err(_) => Some((
                    Err(PipelineError::SynthesisUnavailable(ServiceError::Timeout {
                        stage: Stage::Stream,
                        after: idle,
                    })),
                    None,
                )),
            }
        });
        Self {
            inner: Box::pin(inner),
        }
    }

    /// A stream that yields `fragments` and ends.
    #[must_use]
    pub fn from_fragments(fragments: Vec<String>) -> Self {
        Self {
            inner: Box::pin(futures::stream::iter(fragments.into_iter().map(Ok))),
        }
    }

    /// A stream whose only item is `error`.
    #[must_use]
    pub fn failed(error: PipelineError) -> Self {
        Self {
            inner: Box::pin(futures::stream::once(async move { Err(error) })),
        }
    }

    /// Drain the stream, keeping every fragment received before a failure.
    pub async fn into_answer(mut self) -> Answer {
        let mut text = String::new();
        let mut fragments = 0usize;
        while let Some(item) = self.inner.next().await {
            match item {
                Ok(fragment) => {
                    fragments += 1;
                    text.push_str(&fragment);
                }
                Err(error) => {
                    tracing::warn!(fragments, "answer interrupted: {error}");
                    return Answer {
                        text,
                        error: Some(error),
                    };
                }
            }
        }
        Answer { text, error: None }
    }
}

impl Stream for AnswerStream {
    type Item = Result<String, PipelineError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// A drained [`AnswerStream`].
#[derive(Debug)]
pub struct Answer {
    /// Fragments concatenated in arrival order.
    pub text: String,
    /// Set when generation stopped early; `text` holds the partial answer.
    pub error: Option<PipelineError>,
}

impl Answer {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Sends a prompt to the completion service as a single user message.
///
/// Sampling (temperature, output bound) is carried by the provider.
pub struct AnswerSynthesizer<P> {
    provider: Arc<P>,
    timeout: Duration,
    idle_timeout: Duration,
}

impl<P> Clone for AnswerSynthesizer<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            timeout: self.timeout,
            idle_timeout: self.idle_timeout,
        }
    }
}

impl<P: LlmProvider> AnswerSynthesizer<P> {
    #[must_use]
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            timeout: Duration::from_secs(120),
            idle_timeout: Duration::from_secs(60),
        }
    }

    /// Bound on opening the stream (or the whole answer without streaming).
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Bound on the wait between two fragments.
    #[must_use]
    pub fn with_idle_timeout(mut self, idle: Duration) -> Self {
        self.idle_timeout = idle;
        self
    }

    /// # Errors
    ///
    /// [`PipelineError::SynthesisUnavailable`] when the service fails or times
    /// out before the first fragment.
    pub async fn synthesize(&self, context: &PromptContext) -> Result<AnswerStream, PipelineError> {
        let messages = [Message::user(context.to_prompt())];
        let started = Instant::now();
        let timed_out = || {
            PipelineError::SynthesisUnavailable(ServiceError::Timeout {
                stage: Stage::Completion,
                after: self.timeout,
            })
        };

        if self.provider.supports_streaming() {
            let stream = tokio::time::timeout(self.timeout, self.provider.chat_stream(&messages))
                .await
                .map_err(|_| timed_out())?
                .map_err(|e| PipelineError::SynthesisUnavailable(e.into()))?;
            tracing::debug!(
                provider = self.provider.name(),
                elapsed_ms = started.elapsed().as_millis(),
                "answer stream opened"
            );
            return Ok(AnswerStream::from_chat(stream, self.idle_timeout));
        }

        let text = tokio::time::timeout(self.timeout, self.provider.chat(&messages))
            .await
            .map_err(|_| timed_out())?
            .map_err(|e| PipelineError::SynthesisUnavailable(e.into()))?;
        tracing::debug!(
            provider = self.provider.name(),
            elapsed_ms = started.elapsed().as_millis(),
            "answer generated without streaming"
        );
        Ok(AnswerStream::from_fragments(vec![text]))
    }
}
