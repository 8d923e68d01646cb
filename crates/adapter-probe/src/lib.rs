//! # Adapter Probe
//!
//! Ad-hoc diagnostic requests against a configured backend, independent of
//! the translation path. A probe is built manually by the operator, issued
//! once, and its response is discarded after display. HTTP-level failures
//! (4xx/5xx) are ordinary responses; only transport failures populate the
//! response's error field.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod docs;
pub mod executor;
pub mod request;

pub use docs::{EndpointDoc, EndpointDocs};
pub use executor::{RequestExecutor, PROBE_TIMEOUT};
pub use request::{AdHocRequest, AdHocResponse, FormField, RequestBody, ToggleEntry};
