//! Shared state handed to request handlers.

use adapter_backends::ModelBackend;
use adapter_probe::{EndpointDocs, RequestExecutor};
use adapter_telemetry::LogChannel;
use std::sync::Arc;

/// Per-run state shared by all connection handlers.
///
/// The backend is built once at start from the target server snapshot;
/// registry edits made while the adapter is running do not reach into it.
/// The probe executor resolves its target per invocation instead, so it
/// always sees the current registry.
#[derive(Clone)]
pub struct AppState {
    /// The translator for the pinned target server
    pub backend: Arc<dyn ModelBackend>,
    /// Channel receiving adapter log entries
    pub logs: Arc<LogChannel>,
    /// Ad-hoc diagnostic request executor
    pub executor: Arc<RequestExecutor>,
    /// Built-in endpoint reference catalog
    pub docs: Arc<EndpointDocs>,
}

impl AppState {
    /// Assemble state for one run
    #[must_use]
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        logs: Arc<LogChannel>,
        executor: Arc<RequestExecutor>,
    ) -> Self {
        Self {
            backend,
            logs,
            executor,
            docs: Arc::new(EndpointDocs::new()),
        }
    }
}
