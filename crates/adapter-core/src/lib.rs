//! # Adapter Core
//!
//! Core types and error handling for the LLM protocol adapter.
//!
//! This crate provides the foundational types used throughout the adapter:
//! - OpenAI-compatible request, response, and streaming chunk shapes
//! - The adapter configuration record and its validation rules
//! - Error types and handling
//! - Small validated domain types (newtypes)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod request;
pub mod response;
pub mod streaming;
pub mod types;

// Re-export commonly used types
pub use config::AdapterConfig;
pub use error::{AdapterError, AdapterResult};
pub use request::{ChatCompletionRequest, ChatMessage, MessageRole, SamplingParams};
pub use response::{
    ChatCompletionResponse, Choice, ErrorBody, ErrorResponse, FinishReason, ModelObject,
    ModelsResponse, ResponseMessage, Usage,
};
pub use streaming::{ChatChunk, ChunkChoice, ChunkDelta, ChunkStream};
pub use types::{CorrelationId, GenerationDefaults, ServerId};
