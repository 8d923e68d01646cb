//! Process-level logging initialization.

use crate::bridge::LogChannelLayer;
use crate::logchan::LogChannel;
use std::sync::Arc;
use thiserror::Error;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of the human-readable format
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    /// Create a default logging configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default filter level
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Enable JSON output
    #[must_use]
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

/// Errors raised during logging initialization
#[derive(Debug, Error)]
pub enum LoggingError {
    /// A global subscriber was already installed
    #[error("failed to initialize logging: {0}")]
    Init(String),
}

/// Install the global tracing subscriber.
///
/// When `channel` is given, adapter-scoped events are mirrored into it via
/// [`LogChannelLayer`] in addition to the formatted output.
///
/// # Errors
/// Returns [`LoggingError::Init`] if a subscriber is already installed.
pub fn init_logging(
    config: &LoggingConfig,
    channel: Option<Arc<LogChannel>>,
) -> Result<(), LoggingError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let fmt_layer = if config.json {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().boxed()
    };

    let channel_layer =
        channel.map(|c| LogChannelLayer::new(c).with_target_prefix("adapter"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(channel_layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder_chains() {
        let config = LoggingConfig::new().with_level("debug").with_json(true);
        assert_eq!(config.level, "debug");
        assert!(config.json);
    }
}
