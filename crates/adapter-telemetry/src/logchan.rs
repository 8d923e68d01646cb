//! Bounded, concurrency-safe log channel.
//!
//! The channel is the one structure all concurrent request handlers and the
//! lifecycle manager write into simultaneously. Entries are immutable after
//! push. When the channel is full the single oldest entry is evicted
//! atomically with the insert, so readers never observe the buffer above
//! capacity nor a gap larger than one entry.

use adapter_core::CorrelationId;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::broadcast;

/// Fixed capacity of the log channel
pub const LOG_CHANNEL_CAPACITY: usize = 500;

/// Severity of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Diagnostic detail
    Debug,
    /// Routine operation
    Info,
    /// Recoverable anomaly
    Warn,
    /// Failure
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// One structured log entry, immutable once created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Severity
    pub level: LogLevel,
    /// Message text
    pub message: String,
    /// Ties the entry to one in-flight request, when applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<CorrelationId>,
}

impl LogEntry {
    /// Create an entry at the given level
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            correlation_id: None,
        }
    }

    /// Create a debug entry
    pub fn debug(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Debug, message)
    }

    /// Create an info entry
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    /// Create a warn entry
    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warn, message)
    }

    /// Create an error entry
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, message)
    }

    /// Attach a correlation id
    #[must_use]
    pub fn with_correlation(mut self, id: CorrelationId) -> Self {
        self.correlation_id = Some(id);
        self
    }
}

/// Bounded ring of log entries with live subscription
pub struct LogChannel {
    entries: Mutex<VecDeque<LogEntry>>,
    capacity: usize,
    live: broadcast::Sender<LogEntry>,
}

impl Default for LogChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl LogChannel {
    /// Create a channel with the fixed capacity of 500 entries
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(LOG_CHANNEL_CAPACITY)
    }

    /// Create a channel with an explicit capacity (tests only use this)
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (live, _) = broadcast::channel(capacity.max(1));
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            live,
        }
    }

    /// Append an entry, evicting the single oldest one when full.
    ///
    /// Non-blocking and safe under unlimited concurrent callers; eviction
    /// and insert happen under one lock acquisition.
    pub fn push(&self, entry: LogEntry) {
        {
            let mut entries = self.entries.lock();
            if entries.len() == self.capacity {
                entries.pop_front();
            }
            entries.push_back(entry.clone());
        }
        // Live delivery is best-effort; a lagging subscriber drops entries
        // on its own receiver, never in the ring.
        let _ = self.live.send(entry);
    }

    /// Copy out all retained entries in insertion order
    #[must_use]
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Remove and return all retained entries in insertion order
    pub fn drain(&self) -> Vec<LogEntry> {
        self.entries.lock().drain(..).collect()
    }

    /// Subscribe to entries pushed after this call
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.live.subscribe()
    }

    /// Reset the ring to empty.
    ///
    /// The clear itself is logged by the caller, not by the channel.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of retained entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the ring is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
