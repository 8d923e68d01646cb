//! Streaming chunk shapes for incrementally delivered completions.
//!
//! The adapter forwards backend tokens as OpenAI-compatible
//! `chat.completion.chunk` objects. A stream carries zero or more content
//! chunks followed by exactly one terminal chunk with a finish reason; the
//! transport layer then appends the literal `[DONE]` marker.

use crate::request::MessageRole;
use crate::response::{FinishReason, Usage};
use crate::AdapterError;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Boxed stream of translated chunks
pub type ChunkStream = BoxStream<'static, Result<ChatChunk, AdapterError>>;

/// One streamed chunk of a chat completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChunk {
    /// Response identifier, shared by all chunks of one stream
    pub id: String,

    /// Object type, always `chat.completion.chunk`
    pub object: String,

    /// Unix timestamp of creation
    pub created: i64,

    /// Model producing the stream
    pub model: String,

    /// Chunk choices (always exactly one)
    pub choices: Vec<ChunkChoice>,

    /// Usage totals, present only on the terminal chunk when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl ChatChunk {
    /// A chunk carrying a piece of generated content
    pub fn content(
        id: impl Into<String>,
        model: impl Into<String>,
        created: i64,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            object: "chat.completion.chunk".to_string(),
            created,
            model: model.into(),
            choices: vec![ChunkChoice {
                index: 0,
                delta: ChunkDelta {
                    role: Some(MessageRole::Assistant),
                    content: Some(content.into()),
                },
                finish_reason: None,
            }],
            usage: None,
        }
    }

    /// The terminal chunk, emitted exactly once per stream
    pub fn terminal(
        id: impl Into<String>,
        model: impl Into<String>,
        created: i64,
        finish_reason: FinishReason,
        usage: Option<Usage>,
    ) -> Self {
        Self {
            id: id.into(),
            object: "chat.completion.chunk".to_string(),
            created,
            model: model.into(),
            choices: vec![ChunkChoice {
                index: 0,
                delta: ChunkDelta {
                    role: None,
                    content: None,
                },
                finish_reason: Some(finish_reason),
            }],
            usage,
        }
    }

    /// Whether this is the terminal chunk of its stream
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.choices
            .first()
            .is_some_and(|c| c.finish_reason.is_some())
    }
}

/// One choice within a streamed chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkChoice {
    /// Choice index
    pub index: u32,
    /// Incremental content delta
    pub delta: ChunkDelta,
    /// Set only on the terminal chunk
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

/// Incremental message delta
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkDelta {
    /// Author role, present on the first chunk
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<MessageRole>,
    /// New content fragment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_chunk_is_not_terminal() {
        let chunk = ChatChunk::content("id", "llama3", 0, "Hel");
        assert!(!chunk.is_terminal());
        assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("Hel"));
    }

    #[test]
    fn terminal_chunk_carries_finish_reason() {
        let chunk = ChatChunk::terminal("id", "llama3", 0, FinishReason::Stop, None);
        assert!(chunk.is_terminal());
        assert_eq!(chunk.choices[0].finish_reason, Some(FinishReason::Stop));
        assert!(chunk.choices[0].delta.content.is_none());
    }

    #[test]
    fn delta_omits_absent_fields() {
        let chunk = ChatChunk::terminal("id", "m", 0, FinishReason::Stop, None);
        let json = serde_json::to_string(&chunk).expect("serialize");
        assert!(!json.contains("\"content\""));
        assert!(json.contains("\"finish_reason\":\"stop\""));
    }
}
