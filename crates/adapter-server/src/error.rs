//! API error responses.

use adapter_core::{AdapterError, ErrorResponse};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::warn;

/// Wrapper rendering [`AdapterError`] as an OpenAI-style error body.
///
/// The body carries the stable `error.type` string clients can branch on;
/// the status code follows from the error class.
#[derive(Debug)]
pub struct ApiError(AdapterError);

impl ApiError {
    /// The HTTP status this error maps to
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            AdapterError::Validation { .. } | AdapterError::UnsupportedRequest { .. } => {
                StatusCode::BAD_REQUEST
            }
            AdapterError::NotFound { .. } => StatusCode::NOT_FOUND,
            AdapterError::Inactive { .. } | AdapterError::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }
            AdapterError::UpstreamUnreachable { .. }
            | AdapterError::UpstreamProtocol { .. }
            | AdapterError::Transport { .. } => StatusCode::BAD_GATEWAY,
            AdapterError::Bind { .. }
            | AdapterError::Store { .. }
            | AdapterError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The wrapped adapter error
    #[must_use]
    pub fn inner(&self) -> &AdapterError {
        &self.0
    }
}

impl From<AdapterError> for ApiError {
    fn from(err: AdapterError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        warn!(status = %status, error = %self.0, "request failed");
        let body = ErrorResponse::new(self.0.to_string(), self.0.error_type());
        (status, Json(body)).into_response()
    }
}
