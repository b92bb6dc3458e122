use ollama_rs::Ollama;
use ollama_rs::generation::chat::ChatMessage;
use ollama_rs::generation::chat::request::ChatMessageRequest;
use ollama_rs::generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest};
use ollama_rs::models::ModelOptions;
use tokio_stream::StreamExt;

use crate::error::LlmError;
use crate::provider::{ChatStream, LlmProvider, Message, Role, SamplingConfig};

const DEFAULT_PORT: u16 = 11434;

/// Models served by a local Ollama daemon.
///
/// Either model may be left empty when the handle is only used for the other
/// capability; embedding with no embedding model is reported as unsupported.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Ollama,
    model: String,
    embedding_model: String,
    sampling: SamplingConfig,
}

impl OllamaProvider {
    #[must_use]
    pub fn new(base_url: &str, model: String, embedding_model: String) -> Self {
        let (host, port) = split_base_url(base_url);
        Self {
            client: Ollama::new(host, port),
            model,
            embedding_model,
            sampling: SamplingConfig::default(),
        }
    }

    #[must_use]
    pub fn with_sampling(mut self, sampling: SamplingConfig) -> Self {
        self.sampling = sampling;
        self
    }

    fn chat_request(&self, messages: &[Message]) -> ChatMessageRequest {
        let history = messages.iter().map(to_ollama).collect();
        let options = ModelOptions::default()
            .temperature(self.sampling.temperature)
            .num_predict(i32::try_from(self.sampling.max_tokens).unwrap_or(i32::MAX));
        ChatMessageRequest::new(self.model.clone(), history).options(options)
    }
}

impl LlmProvider for OllamaProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        let reply = self
            .client
            .send_chat_messages(self.chat_request(messages))
            .await
            .map_err(|e| LlmError::Other(format!("ollama chat failed: {e}")))?;
        Ok(reply.message.content)
    }

    async fn chat_stream(&self, messages: &[Message]) -> Result<ChatStream, LlmError> {
        let chunks = self
            .client
            .send_chat_messages_stream(self.chat_request(messages))
            .await
            .map_err(|e| LlmError::Other(format!("ollama stream failed to open: {e}")))?;

        let fragments = chunks.filter_map(|chunk| match chunk {
            Ok(reply) if reply.message.content.is_empty() => None,
            Ok(reply) => Some(Ok(reply.message.content)),
            Err(()) => Some(Err(LlmError::Other("ollama stream broke off".into()))),
        });
        Ok(Box::pin(fragments))
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        if !self.supports_embeddings() {
            return Err(LlmError::EmbedUnsupported {
                provider: "ollama".into(),
            });
        }
        let request =
            GenerateEmbeddingsRequest::new(self.embedding_model.clone(), EmbeddingsInput::from(text));
        let response = self
            .client
            .generate_embeddings(request)
            .await
            .map_err(|e| LlmError::Other(format!("ollama embedding failed: {e}")))?;
        response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::EmptyResponse {
                provider: "ollama".into(),
            })
    }

    fn supports_embeddings(&self) -> bool {
        !self.embedding_model.is_empty()
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ollama"
    }
}

fn to_ollama(msg: &Message) -> ChatMessage {
    let text = msg.content.clone();
    match msg.role {
        Role::User => ChatMessage::user(text),
        Role::System => ChatMessage::system(text),
        Role::Assistant => ChatMessage::assistant(text),
    }
}

/// `ollama-rs` takes host and port separately.
fn split_base_url(base_url: &str) -> (String, u16) {
    let trimmed = base_url.trim_end_matches('/');
    trimmed
        .rsplit_once(':')
        .and_then(|(host, port)| Some((host.to_owned(), port.parse().ok()?)))
        .unwrap_or_else(|| (trimmed.to_owned(), DEFAULT_PORT))
}
