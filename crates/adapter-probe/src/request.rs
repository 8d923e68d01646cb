//! Ad-hoc request and response shapes.

use adapter_core::ServerId;
use serde::{Deserialize, Serialize};

/// A key/value pair with an enable toggle.
///
/// Disabled entries are excluded from the outgoing request but retained in
/// the request state so the operator can re-enable them later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleEntry {
    /// Header or parameter name
    pub key: String,
    /// Header or parameter value
    pub value: String,
    /// Whether the entry is sent on the wire
    pub enabled: bool,
}

impl ToggleEntry {
    /// Create an enabled entry
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            enabled: true,
        }
    }

    /// Create a disabled entry
    pub fn disabled(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            enabled: false,
            ..Self::new(key, value)
        }
    }
}

/// One form field in a form-encoded body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    /// Field name
    pub key: String,
    /// Field value
    pub value: String,
}

/// Request body variant.
///
/// A closed sum with exactly one active variant: a raw body cannot carry
/// form fields and vice versa, by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum RequestBody {
    /// No body
    #[default]
    None,
    /// Raw body with an explicit content type
    Raw {
        /// The body bytes, as text
        content: String,
        /// Value for the Content-Type header
        content_type: String,
    },
    /// Form-encoded field list
    Form {
        /// Fields, sent in order
        fields: Vec<FormField>,
    },
}

/// A manually constructed diagnostic request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdHocRequest {
    /// HTTP method name
    pub method: String,

    /// Backend server to probe
    pub target_server_id: ServerId,

    /// Path relative to the server's base URL
    pub path: String,

    /// Query parameters, in order, with enable toggles
    #[serde(default)]
    pub query_params: Vec<ToggleEntry>,

    /// Headers, in order, with enable toggles
    #[serde(default)]
    pub headers: Vec<ToggleEntry>,

    /// Body variant
    #[serde(default)]
    pub body: RequestBody,
}

impl AdHocRequest {
    /// Create a bodyless request
    pub fn new(
        method: impl Into<String>,
        target: ServerId,
        path: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            target_server_id: target,
            path: path.into(),
            query_params: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::None,
        }
    }
}

/// The outcome of one probe.
///
/// Transient: created per invocation, discarded after display.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdHocResponse {
    /// HTTP status code; unset on transport failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    /// Canonical status text, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,

    /// Response headers
    #[serde(default)]
    pub headers: Vec<ToggleEntry>,

    /// Response body as text
    #[serde(default)]
    pub body: String,

    /// Wall-clock duration from dispatch to full response receipt
    pub duration_ms: u64,

    /// Transport-level failure, when the request never completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AdHocResponse {
    /// A response representing a transport failure
    pub fn failed(error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            error: Some(error.into()),
            duration_ms,
            ..Self::default()
        }
    }
}
