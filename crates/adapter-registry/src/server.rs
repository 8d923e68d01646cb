//! Backend server connection descriptors.

use adapter_core::ServerId;
use serde::{Deserialize, Serialize};

/// Protocol dialect spoken by a backend server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Ollama native API (`/api/chat`, NDJSON streaming)
    #[default]
    Ollama,
    /// A backend that already exposes the OpenAI wire shape (SSE streaming)
    #[serde(rename = "openai-compat")]
    OpenAiCompat,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ollama => write!(f, "ollama"),
            Self::OpenAiCompat => write!(f, "openai-compat"),
        }
    }
}

/// One configured backend model server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendServer {
    /// Unique, stable identifier
    pub id: ServerId,

    /// Operator-facing name
    pub display_name: String,

    /// Root URL of the backend's HTTP API
    pub base_url: String,

    /// Optional API key sent to the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Administrative enable flag
    pub is_active: bool,

    /// Last connectivity probe result, free-form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_status: Option<String>,

    /// Protocol dialect
    #[serde(default)]
    pub kind: BackendKind,
}

impl BackendServer {
    /// Create an active server with a freshly generated id
    pub fn new(display_name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            id: ServerId::generate(),
            display_name: display_name.into(),
            base_url: base_url.into(),
            api_key: None,
            is_active: true,
            test_status: None,
            kind: BackendKind::default(),
        }
    }

    /// Set the protocol dialect
    #[must_use]
    pub fn with_kind(mut self, kind: BackendKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the API key
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set an explicit id (used when loading persisted records)
    #[must_use]
    pub fn with_id(mut self, id: ServerId) -> Self {
        self.id = id;
        self
    }

    /// Base URL without a trailing slash
    #[must_use]
    pub fn trimmed_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
