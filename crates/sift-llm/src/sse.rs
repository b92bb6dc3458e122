use eventsource_stream::Eventsource;
use serde::Deserialize;
use tokio_stream::StreamExt;

use crate::error::LlmError;
use crate::provider::ChatStream;

const DONE: &str = "[DONE]";

/// What one `data:` line of a chat-completions stream carries.
#[derive(Debug, PartialEq)]
enum Event {
    Fragment(String),
    /// Role announcements, finish markers, and other content-free chunks.
    Empty,
    Done,
}

/// Turn a streaming chat-completions response into text fragments.
///
/// Events are decoded as the consumer polls. The stream ends at `[DONE]` or
/// when the body closes.
pub(crate) fn openai_sse_to_stream(response: reqwest::Response) -> ChatStream {
    let fragments = response
        .bytes_stream()
        .eventsource()
        .map(|event| {
            event
                .map_err(|e| LlmError::SseParse(e.to_string()))
                .and_then(|event| decode(&event.data))
        })
        .take_while(|decoded| !matches!(decoded, Ok(Event::Done)))
        .filter_map(|decoded| match decoded {
            Ok(Event::Fragment(text)) => Some(Ok(text)),
            Ok(Event::Empty | Event::Done) => None,
            Err(e) => Some(Err(e)),
        });
    Box::pin(fragments)
}

fn decode(data: &str) -> Result<Event, LlmError> {
    if data.trim() == DONE {
        return Ok(Event::Done);
    }
    let chunk: Chunk = serde_json::from_str(data)
        .map_err(|e| LlmError::SseParse(format!("malformed stream chunk: {e}")))?;
    if let Some(error) = chunk.error {
        return Err(LlmError::SseParse(format!(
            "provider aborted stream: {}",
            error.message
        )));
    }
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .filter(|text| !text.is_empty())
        .map_or(Event::Empty, Event::Fragment))
}

#[derive(Deserialize)]
struct Chunk {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    error: Option<ChunkError>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Deserialize, Default)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChunkError {
    message: String,
}
