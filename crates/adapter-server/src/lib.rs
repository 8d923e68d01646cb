//! # Adapter Server
//!
//! HTTP surface and lifecycle management for the protocol adapter.
//!
//! This crate provides:
//! - Axum-based HTTP server exposing the OpenAI-compatible endpoints
//! - Translation handlers for blocking and streamed chat completions
//! - The lifecycle manager driving Stopped/Starting/Running/Stopping
//! - Status broadcasting for observers

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use lifecycle::{AdapterManager, AdapterStatus, LifecycleState, STOP_GRACE_PERIOD};
pub use routes::create_router;
pub use state::AppState;
