//! Test-only mock LLM provider.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::LlmError;
use crate::provider::{ChatStream, LlmProvider, Message};

#[derive(Debug, Clone)]
pub struct MockProvider {
    pub fragments: Vec<String>,
    /// Emit this many fragments, then fail the stream.
    pub fail_after: Option<usize>,
    pub fail_chat: bool,
    pub embedding: Vec<f32>,
    pub supports_embeddings: bool,
    pub fail_embed: bool,
    /// Milliseconds to sleep before answering any call.
    pub delay_ms: u64,
    stream_calls: Arc<AtomicUsize>,
    embed_calls: Arc<AtomicUsize>,
    last_messages: Arc<Mutex<Vec<Message>>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            fragments: vec!["mock ".into(), "response".into()],
            fail_after: None,
            fail_chat: false,
            embedding: vec![1.0, 0.0, 0.0],
            supports_embeddings: true,
            fail_embed: false,
            delay_ms: 0,
            stream_calls: Arc::new(AtomicUsize::new(0)),
            embed_calls: Arc::new(AtomicUsize::new(0)),
            last_messages: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockProvider {
    #[must_use]
    pub fn with_fragments<S: Into<String>>(fragments: impl IntoIterator<Item = S>) -> Self {
        Self {
            fragments: fragments.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_chat: true,
            fail_embed: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }

    #[must_use]
    pub fn fail_after(mut self, fragments: usize) -> Self {
        self.fail_after = Some(fragments);
        self
    }

    #[must_use]
    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    /// Number of `chat_stream` calls made against this provider or its clones.
    #[must_use]
    pub fn stream_calls(&self) -> usize {
        self.stream_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    /// Messages received by the most recent `chat` or `chat_stream` call.
    #[must_use]
    pub fn last_messages(&self) -> Vec<Message> {
        self.last_messages.lock().unwrap().clone()
    }

    async fn pause(&self) {
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
    }
}

impl LlmProvider for MockProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        self.pause().await;
        *self.last_messages.lock().unwrap() = messages.to_vec();
        if self.fail_chat {
            return Err(LlmError::Other("mock LLM error".into()));
        }
        Ok(self.fragments.concat())
    }

    async fn chat_stream(&self, messages: &[Message]) -> Result<ChatStream, LlmError> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        *self.last_messages.lock().unwrap() = messages.to_vec();
        if self.fail_chat {
            return Err(LlmError::Other("mock LLM error".into()));
        }
        let take = self.fail_after.unwrap_or(self.fragments.len());
        let mut items: Vec<Result<String, LlmError>> = self
            .fragments
            .iter()
            .take(take)
            .cloned()
            .map(Ok)
            .collect();
        if self.fail_after.is_some() {
            items.push(Err(LlmError::Other("mock stream interrupted".into())));
        }
        Ok(Box::pin(tokio_stream::iter(items)))
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>, LlmError> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if !self.supports_embeddings {
            return Err(LlmError::EmbedUnsupported {
                provider: "mock".into(),
            });
        }
        if self.fail_embed {
            return Err(LlmError::Other("mock embedding error".into()));
        }
        Ok(self.embedding.clone())
    }

    fn supports_embeddings(&self) -> bool {
        self.supports_embeddings
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}
