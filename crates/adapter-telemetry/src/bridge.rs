//! Bridge from `tracing` events into the log channel.
//!
//! Request handlers instrument through ordinary `tracing` macros; this
//! layer mirrors matching events into the [`LogChannel`] so observers see
//! the same lines without a second logging API.

use crate::logchan::{LogChannel, LogEntry, LogLevel};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// `tracing` layer that forwards events to a [`LogChannel`]
pub struct LogChannelLayer {
    channel: Arc<LogChannel>,
    target_prefix: Option<String>,
}

impl LogChannelLayer {
    /// Forward every event to the channel
    #[must_use]
    pub fn new(channel: Arc<LogChannel>) -> Self {
        Self {
            channel,
            target_prefix: None,
        }
    }

    /// Forward only events whose target starts with the given prefix
    #[must_use]
    pub fn with_target_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.target_prefix = Some(prefix.into());
        self
    }

    fn level_of(level: &Level) -> LogLevel {
        match *level {
            Level::ERROR => LogLevel::Error,
            Level::WARN => LogLevel::Warn,
            Level::INFO => LogLevel::Info,
            // TRACE collapses into DEBUG; the channel has no finer level.
            _ => LogLevel::Debug,
        }
    }
}

impl<S: Subscriber> Layer<S> for LogChannelLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if let Some(prefix) = &self.target_prefix {
            if !event.metadata().target().starts_with(prefix.as_str()) {
                return;
            }
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let level = Self::level_of(event.metadata().level());
        self.channel.push(LogEntry::new(level, visitor.into_message()));
    }
}

/// Collects the `message` field plus remaining fields as `key=value` pairs
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn into_message(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields
        } else {
            format!("{} {}", self.message, self.fields)
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            if !self.fields.is_empty() {
                self.fields.push(' ');
            }
            let _ = write!(self.fields, "{}={value}", field.name());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            if !self.fields.is_empty() {
                self.fields.push(' ');
            }
            let _ = write!(self.fields, "{}={value:?}", field.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn events_land_in_the_channel() {
        let channel = Arc::new(LogChannel::new());
        let subscriber =
            tracing_subscriber::registry().with(LogChannelLayer::new(Arc::clone(&channel)));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("listener started");
            tracing::error!(port = 11223, "bind failed");
        });

        let entries = channel.snapshot();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].level, LogLevel::Info);
        assert_eq!(entries[0].message, "listener started");
        assert_eq!(entries[1].level, LogLevel::Error);
        assert!(entries[1].message.contains("bind failed"));
        assert!(entries[1].message.contains("port=11223"));
    }

    #[test]
    fn target_prefix_filters_foreign_events() {
        let channel = Arc::new(LogChannel::new());
        let layer =
            LogChannelLayer::new(Arc::clone(&channel)).with_target_prefix("adapter_telemetry");
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "hyper::client", "noise");
            tracing::info!("kept");
        });

        let entries = channel.snapshot();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "kept");
    }
}
