use crate::error::LlmError;
use crate::openai::OpenAiProvider;
use crate::provider::{ChatStream, LlmProvider, Message, SamplingConfig};

/// Groq's OpenAI-compatible API root.
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// A third-party endpoint speaking the OpenAI chat-completions protocol
/// (Groq, Together, vLLM, ...). Logs and errors carry its own name.
#[derive(Debug, Clone)]
pub struct CompatibleProvider {
    inner: OpenAiProvider,
}

impl CompatibleProvider {
    #[must_use]
    pub fn new(
        name: String,
        api_key: String,
        base_url: String,
        model: String,
        embedding_model: Option<String>,
    ) -> Self {
        Self {
            inner: OpenAiProvider::new(api_key, base_url, model, embedding_model).with_name(name),
        }
    }

    /// Groq-hosted completion model. Groq serves no embeddings.
    #[must_use]
    pub fn groq(api_key: String, model: String) -> Self {
        Self::new("groq".into(), api_key, GROQ_BASE_URL.into(), model, None)
    }

    #[must_use]
    pub fn with_sampling(mut self, sampling: SamplingConfig) -> Self {
        self.inner = self.inner.with_sampling(sampling);
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.inner = self.inner.with_max_retries(max_retries);
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        self.inner.model()
    }
}

impl LlmProvider for CompatibleProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        self.inner.chat(messages).await
    }

    async fn chat_stream(&self, messages: &[Message]) -> Result<ChatStream, LlmError> {
        self.inner.chat_stream(messages).await
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.inner.embed(text).await
    }

    fn supports_embeddings(&self) -> bool {
        self.inner.supports_embeddings()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
