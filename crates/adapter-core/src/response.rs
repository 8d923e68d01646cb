//! Outbound OpenAI-compatible response shapes.

use crate::request::MessageRole;
use serde::{Deserialize, Serialize};

/// Complete (non-streamed) chat completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    /// Response identifier
    pub id: String,

    /// Object type, always `chat.completion`
    pub object: String,

    /// Unix timestamp of creation
    pub created: i64,

    /// Model that produced the response
    pub model: String,

    /// Completion choices (the adapter always produces exactly one)
    pub choices: Vec<Choice>,

    /// Token accounting
    pub usage: Usage,
}

impl ChatCompletionResponse {
    /// Assemble a single-choice response
    pub fn single(
        id: impl Into<String>,
        model: impl Into<String>,
        created: i64,
        content: impl Into<String>,
        finish_reason: FinishReason,
        usage: Usage,
    ) -> Self {
        Self {
            id: id.into(),
            object: "chat.completion".to_string(),
            created,
            model: model.into(),
            choices: vec![Choice {
                index: 0,
                message: ResponseMessage {
                    role: MessageRole::Assistant,
                    content: content.into(),
                },
                finish_reason: Some(finish_reason),
            }],
            usage,
        }
    }
}

/// One completion choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    /// Choice index
    pub index: u32,
    /// The generated message
    pub message: ResponseMessage,
    /// Why generation stopped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

/// Message produced by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMessage {
    /// Author role, always assistant
    pub role: MessageRole,
    /// Generated text
    pub content: String,
}

/// Why generation stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural stop or stop sequence hit
    Stop,
    /// Token limit reached
    Length,
    /// Generation aborted by an error
    Error,
}

/// Token usage accounting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens consumed by the prompt
    pub prompt_tokens: u32,
    /// Tokens generated
    pub completion_tokens: u32,
    /// Sum of the two
    pub total_tokens: u32,
}

impl Usage {
    /// Build usage from prompt and completion counts
    #[must_use]
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// OpenAI-style error envelope returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// The error payload
    pub error: ErrorBody,
}

/// OpenAI-style error payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable description
    pub message: String,
    /// Stable machine-readable type
    #[serde(rename = "type")]
    pub error_type: String,
}

impl ErrorResponse {
    /// Build an error envelope from a message and type
    pub fn new(message: impl Into<String>, error_type: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                message: message.into(),
                error_type: error_type.into(),
            },
        }
    }
}

/// One entry in the model listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelObject {
    /// Model identifier
    pub id: String,
    /// Object type, always `model`
    pub object: String,
    /// Unix timestamp the model was created/modified
    pub created: i64,
    /// Owner label
    pub owned_by: String,
}

impl ModelObject {
    /// Create a model object owned by the given label
    pub fn new(id: impl Into<String>, owned_by: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            object: "model".to_string(),
            created: 0,
            owned_by: owned_by.into(),
        }
    }
}

/// OpenAI-compatible model list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    /// Object type, always `list`
    pub object: String,
    /// The models
    pub data: Vec<ModelObject>,
}

impl ModelsResponse {
    /// Wrap a list of model objects
    #[must_use]
    pub fn new(data: Vec<ModelObject>) -> Self {
        Self {
            object: "list".to_string(),
            data,
        }
    }
}
