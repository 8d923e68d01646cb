//! Inbound OpenAI-compatible request shapes.
//!
//! The adapter accepts the widely used chat-completion request format.
//! Fields it does not model are dropped during deserialization rather than
//! rejected, so clients may send newer features without breaking the
//! adapter.

use crate::error::{AdapterError, AdapterResult};
use crate::types::GenerationDefaults;
use serde::{Deserialize, Serialize};

/// OpenAI-compatible chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    /// Target model name, passed through to the backend
    pub model: String,

    /// Conversation messages in order
    pub messages: Vec<ChatMessage>,

    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Nucleus sampling cutoff
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Top-k sampling cutoff (extension accepted by local backends)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Context window length (extension accepted by local backends)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_length: Option<u32>,

    /// Repetition penalty (extension accepted by local backends)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_penalty: Option<f32>,

    /// Stop sequences
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,

    /// Request an incrementally streamed response
    #[serde(default)]
    pub stream: bool,
}

impl ChatCompletionRequest {
    /// Create a minimal request for the given model and messages
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            top_p: None,
            top_k: None,
            max_tokens: None,
            context_length: None,
            repeat_penalty: None,
            stop: None,
            stream: false,
        }
    }

    /// Check the request can be mapped to a backend at all.
    ///
    /// # Errors
    /// Returns [`AdapterError::UnsupportedRequest`] when the payload is
    /// structurally unmappable.
    pub fn validate(&self) -> AdapterResult<()> {
        if self.model.is_empty() {
            return Err(AdapterError::unsupported_request("model must not be empty"));
        }
        if self.messages.is_empty() {
            return Err(AdapterError::unsupported_request(
                "messages must not be empty",
            ));
        }
        Ok(())
    }

    /// Resolve effective sampling parameters against adapter defaults.
    ///
    /// Values present on the request win; absent values fall back to the
    /// configured defaults. No range coercion happens here; the backend is
    /// the authority on validation.
    #[must_use]
    pub fn sampling(&self, defaults: &GenerationDefaults) -> SamplingParams {
        SamplingParams {
            temperature: self.temperature.or(defaults.temperature),
            top_p: self.top_p.or(defaults.top_p),
            top_k: self.top_k.or(defaults.top_k),
            context_length: self.context_length.or(defaults.context_length),
            max_tokens: self.max_tokens.or(defaults.max_tokens),
            repeat_penalty: self.repeat_penalty.or(defaults.repeat_penalty),
        }
    }
}

/// Effective sampling parameters after default resolution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SamplingParams {
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Nucleus sampling cutoff
    pub top_p: Option<f32>,
    /// Top-k sampling cutoff
    pub top_k: Option<u32>,
    /// Context window length
    pub context_length: Option<u32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Repetition penalty
    pub repeat_penalty: Option<f32>,
}

/// Chat message with role and content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message author
    pub role: MessageRole,

    /// Text content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction
    System,
    /// End-user message
    User,
    /// Model output
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}
