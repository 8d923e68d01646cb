//! # Adapter Telemetry
//!
//! Instrumentation plumbing for the protocol adapter:
//! - A bounded, concurrency-safe log channel consumed by observers
//! - A `tracing` layer that mirrors adapter events into that channel
//! - Subscriber initialization for process-level logging

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bridge;
pub mod logchan;
pub mod logging;

pub use bridge::LogChannelLayer;
pub use logchan::{LogChannel, LogEntry, LogLevel, LOG_CHANNEL_CAPACITY};
pub use logging::{init_logging, LoggingConfig, LoggingError};
