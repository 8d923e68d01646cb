//! Error types for the adapter.
//!
//! One taxonomy covers the whole subsystem: configuration validation,
//! lifecycle misuse, upstream failures during translation, and transport
//! failures in the ad-hoc executor. Nothing here is fatal to the host
//! process; errors are surfaced to the caller or resolved into a status
//! update and a log entry.

use thiserror::Error;

/// Result alias using [`AdapterError`]
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Errors produced by the adapter subsystem
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Configuration failed validation before any I/O was attempted
    #[error("validation failed: {message}")]
    Validation {
        /// Human-readable description
        message: String,
        /// Offending field, when known
        field: Option<String>,
    },

    /// The listening socket could not be acquired
    #[error("bind failed: {message}")]
    Bind {
        /// Underlying bind failure description
        message: String,
    },

    /// A lifecycle operation was invoked from the wrong state
    #[error("invalid transition: cannot {action} while {state}")]
    InvalidTransition {
        /// The operation that was attempted
        action: String,
        /// The state the adapter was in
        state: String,
    },

    /// A backend server id did not resolve
    #[error("backend server not found: {id}")]
    NotFound {
        /// The unresolved server id
        id: String,
    },

    /// A backend server is administratively disabled
    #[error("backend server is inactive: {id}")]
    Inactive {
        /// The inactive server id
        id: String,
    },

    /// The backend could not be reached (connection refused, timeout)
    #[error("upstream unreachable: {message}")]
    UpstreamUnreachable {
        /// Transport-level failure description
        message: String,
    },

    /// The backend responded with something the translator cannot parse
    #[error("upstream protocol error: {message}")]
    UpstreamProtocol {
        /// What was malformed
        message: String,
    },

    /// The client payload cannot be mapped to the backend protocol at all
    #[error("unsupported request shape: {message}")]
    UnsupportedRequest {
        /// Why the payload is unmappable
        message: String,
    },

    /// Transport failure in the ad-hoc executor (DNS, connect, timeout)
    #[error("transport error: {message}")]
    Transport {
        /// Transport failure description
        message: String,
    },

    /// The persistence collaborator failed
    #[error("store error: {message}")]
    Store {
        /// Persistence failure description
        message: String,
    },

    /// Internal invariant violation
    #[error("internal error: {message}")]
    Internal {
        /// Description of the violation
        message: String,
    },
}

impl AdapterError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>, field: Option<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field,
        }
    }

    /// Create a bind error
    pub fn bind(message: impl Into<String>) -> Self {
        Self::Bind {
            message: message.into(),
        }
    }

    /// Create an invalid-transition error
    pub fn invalid_transition(action: impl Into<String>, state: impl Into<String>) -> Self {
        Self::InvalidTransition {
            action: action.into(),
            state: state.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create an inactive-server error
    pub fn inactive(id: impl Into<String>) -> Self {
        Self::Inactive { id: id.into() }
    }

    /// Create an upstream-unreachable error
    pub fn upstream_unreachable(message: impl Into<String>) -> Self {
        Self::UpstreamUnreachable {
            message: message.into(),
        }
    }

    /// Create an upstream-protocol error
    pub fn upstream_protocol(message: impl Into<String>) -> Self {
        Self::UpstreamProtocol {
            message: message.into(),
        }
    }

    /// Create an unsupported-request error
    pub fn unsupported_request(message: impl Into<String>) -> Self {
        Self::UnsupportedRequest {
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable machine-readable error type, used in OpenAI-style error bodies
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "invalid_request_error",
            Self::Bind { .. } => "bind_error",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::NotFound { .. } => "not_found",
            Self::Inactive { .. } => "server_inactive",
            Self::UpstreamUnreachable { .. } => "upstream_unreachable",
            Self::UpstreamProtocol { .. } => "upstream_protocol_error",
            Self::UnsupportedRequest { .. } => "unsupported_request",
            Self::Transport { .. } => "transport_error",
            Self::Store { .. } => "store_error",
            Self::Internal { .. } => "internal_error",
        }
    }

    /// Whether this error is resolved per-request rather than per-lifecycle
    #[must_use]
    pub fn is_request_scoped(&self) -> bool {
        matches!(
            self,
            Self::UpstreamUnreachable { .. }
                | Self::UpstreamProtocol { .. }
                | Self::UnsupportedRequest { .. }
                | Self::Transport { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_display() {
        let err = AdapterError::validation("listen port out of range", Some("listen_port".into()));
        assert_eq!(err.to_string(), "validation failed: listen port out of range");
        assert_eq!(err.error_type(), "invalid_request_error");
    }

    #[test]
    fn invalid_transition_display() {
        let err = AdapterError::invalid_transition("start", "running");
        assert_eq!(
            err.to_string(),
            "invalid transition: cannot start while running"
        );
    }

    #[test]
    fn request_scoped_classification() {
        assert!(AdapterError::upstream_unreachable("refused").is_request_scoped());
        assert!(AdapterError::upstream_protocol("bad json").is_request_scoped());
        assert!(!AdapterError::bind("in use").is_request_scoped());
        assert!(!AdapterError::invalid_transition("stop", "stopped").is_request_scoped());
    }
}
