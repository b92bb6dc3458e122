use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::provider::{ChatStream, LlmProvider, Message, SamplingConfig};
use crate::retry::send_with_retry;
use crate::sse::openai_sse_to_stream;

const DEFAULT_MAX_RETRIES: u32 = 2;

/// Chat completions and embeddings over the `OpenAI` REST protocol.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    name: String,
    api_key: String,
    base_url: String,
    model: String,
    embedding_model: Option<String>,
    sampling: SamplingConfig,
    max_retries: u32,
}

impl fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("name", &self.name)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .field("sampling", &self.sampling)
            .finish_non_exhaustive()
    }
}

impl OpenAiProvider {
    /// `embedding_model` of `None` leaves the provider completion-only.
    #[must_use]
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        embedding_model: Option<String>,
    ) -> Self {
        Self {
            client: crate::http::default_client(),
            name: "openai".into(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_owned(),
            model,
            embedding_model,
            sampling: SamplingConfig::default(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    #[must_use]
    pub fn with_sampling(mut self, sampling: SamplingConfig) -> Self {
        self.sampling = sampling;
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub(crate) fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn chat_body<'a>(&'a self, messages: &'a [ApiMessage<'a>], stream: bool) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages,
            temperature: self.sampling.temperature,
            max_tokens: self.sampling.max_tokens,
            stream,
        }
    }

    /// POST `body` to `endpoint` with retries; non-success statuses become
    /// `LlmError::Status` and are logged with the response text.
    async fn post<B: Serialize + Sync>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<reqwest::Response, LlmError> {
        let url = format!("{}/{endpoint}", self.base_url);
        let response = send_with_retry(&self.name, self.max_retries, || {
            self.client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(body)
                .send()
        })
        .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = response.text().await.unwrap_or_default();
        tracing::error!(provider = %self.name, %status, endpoint, "request rejected: {detail}");
        Err(LlmError::Status {
            provider: self.name.clone(),
            status: status.as_u16(),
        })
    }

    async fn post_json<B, R>(&self, endpoint: &str, body: &B) -> Result<R, LlmError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let text = self.post(endpoint, body).await?.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    fn empty(&self) -> LlmError {
        LlmError::EmptyResponse {
            provider: self.name.clone(),
        }
    }
}

impl LlmProvider for OpenAiProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        let api_messages = convert_messages(messages);
        let resp: OpenAiChatResponse = self
            .post_json("chat/completions", &self.chat_body(&api_messages, false))
            .await?;
        resp.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| self.empty())
    }

    async fn chat_stream(&self, messages: &[Message]) -> Result<ChatStream, LlmError> {
        let api_messages = convert_messages(messages);
        let response = self
            .post("chat/completions", &self.chat_body(&api_messages, true))
            .await?;
        Ok(openai_sse_to_stream(response))
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let Some(model) = self.embedding_model.as_deref() else {
            return Err(LlmError::EmbedUnsupported {
                provider: self.name.clone(),
            });
        };
        let resp: EmbeddingResponse = self
            .post_json("embeddings", &EmbeddingRequest { input: text, model })
            .await?;
        resp.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| self.empty())
    }

    fn supports_embeddings(&self) -> bool {
        self.embedding_model.is_some()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn convert_messages(messages: &[Message]) -> Vec<ApiMessage<'_>> {
    messages
        .iter()
        .map(|m| ApiMessage {
            role: m.role.as_str(),
            content: &m.content,
        })
        .collect()
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ApiMessage<'a>],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}
