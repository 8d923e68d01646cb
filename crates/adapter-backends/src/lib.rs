//! # Adapter Backends
//!
//! Protocol translators between the adapter's OpenAI-compatible inbound
//! surface and the native APIs of backend model servers.
//!
//! Two dialects are supported:
//! - Ollama's native API (`/api/chat`, newline-delimited JSON streaming)
//! - Backends that already speak the OpenAI wire shape (SSE streaming)
//!
//! Translation is stateless per request. Sampling parameters absent from
//! the incoming request fall back to adapter-configured defaults; values
//! outside a backend's accepted range pass through uncoerced.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod ollama;
pub mod openai_compat;

pub use backend::{backend_for, ModelBackend};
pub use ollama::{OllamaBackend, OllamaConfig};
pub use openai_compat::{OpenAiCompatBackend, OpenAiCompatConfig};
