//! Adapter lifecycle management.
//!
//! The manager owns the listener lifecycle: Stopped, Starting, Running,
//! Stopping. Transitions are serialized through one gate, so concurrent
//! start/stop calls queue instead of interleaving. Every transition is
//! broadcast to status subscribers.
//!
//! Start captures a snapshot of the target server record and pins its id in
//! the registry; the running adapter is unaffected by registry edits, and
//! deleting or deactivating the pinned record is rejected until stop.

use crate::routes::create_router;
use crate::state::AppState;
use adapter_backends::backend_for;
use adapter_core::{AdapterConfig, AdapterError, AdapterResult, GenerationDefaults};
use adapter_probe::RequestExecutor;
use adapter_registry::{BackendRegistry, RegistryStore};
use adapter_telemetry::LogChannel;
use parking_lot::Mutex;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Time stop waits for in-flight requests before aborting the server task
pub const STOP_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Lifecycle state of the adapter listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// No listener, no resources held
    Stopped,
    /// Start in progress: validating, binding, snapshotting
    Starting,
    /// Listener accepting connections
    Running,
    /// Stop in progress: draining connections
    Stopping,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Starting => write!(f, "starting"),
            Self::Running => write!(f, "running"),
            Self::Stopping => write!(f, "stopping"),
        }
    }
}

/// Point-in-time status snapshot, broadcast on every transition
#[derive(Debug, Clone, Serialize)]
pub struct AdapterStatus {
    /// Current lifecycle state
    pub state: LifecycleState,
    /// Whether the listener is serving requests
    pub is_running: bool,
    /// Failure message from the most recent failed start, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Address the listener is bound to while running
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bound_addr: Option<SocketAddr>,
}

struct RunHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
    bound_addr: SocketAddr,
}

/// Drives the adapter through its lifecycle
pub struct AdapterManager {
    registry: Arc<BackendRegistry>,
    store: Arc<dyn RegistryStore>,
    logs: Arc<LogChannel>,
    defaults: GenerationDefaults,
    state: Mutex<LifecycleState>,
    last_error: Mutex<Option<String>>,
    run: Mutex<Option<RunHandle>>,
    // Serializes start/stop so state checks and side effects stay atomic.
    transition: tokio::sync::Mutex<()>,
    status_tx: broadcast::Sender<AdapterStatus>,
}

impl AdapterManager {
    /// Create a stopped manager
    pub fn new(
        registry: Arc<BackendRegistry>,
        store: Arc<dyn RegistryStore>,
        logs: Arc<LogChannel>,
        defaults: GenerationDefaults,
    ) -> Self {
        let (status_tx, _) = broadcast::channel(32);
        Self {
            registry,
            store,
            logs,
            defaults,
            state: Mutex::new(LifecycleState::Stopped),
            last_error: Mutex::new(None),
            run: Mutex::new(None),
            transition: tokio::sync::Mutex::new(()),
            status_tx,
        }
    }

    /// Current status snapshot
    #[must_use]
    pub fn status(&self) -> AdapterStatus {
        let state = *self.state.lock();
        AdapterStatus {
            state,
            is_running: state == LifecycleState::Running,
            last_error: self.last_error.lock().clone(),
            bound_addr: self.run.lock().as_ref().map(|h| h.bound_addr),
        }
    }

    /// Whether the listener is serving requests
    #[must_use]
    pub fn is_running(&self) -> bool {
        *self.state.lock() == LifecycleState::Running
    }

    /// Subscribe to status transitions
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AdapterStatus> {
        self.status_tx.subscribe()
    }

    /// Load the persisted adapter config, falling back to defaults
    pub async fn persisted_config(&self) -> AdapterResult<AdapterConfig> {
        Ok(self
            .store
            .load_adapter_config()
            .await?
            .unwrap_or_default())
    }

    /// Validate and persist a configuration without starting the adapter.
    ///
    /// # Errors
    /// `InvalidTransition` while the adapter is running, since the active
    /// listener would no longer match the stored config.
    pub async fn save_config(&self, config: &AdapterConfig) -> AdapterResult<()> {
        let _gate = self.transition.lock().await;

        let state = *self.state.lock();
        if state != LifecycleState::Stopped {
            return Err(AdapterError::invalid_transition(
                "save config",
                state.to_string(),
            ));
        }

        config.validate()?;
        self.store.save_adapter_config(config).await
    }

    /// Start the adapter with the given configuration.
    ///
    /// Validates, resolves the target against the registry, persists the
    /// config, binds the listener, pins the target, and begins serving. On
    /// any failure every acquired resource is released, the state returns
    /// to Stopped, and the failure is recorded as the last error.
    ///
    /// # Errors
    /// `InvalidTransition` when not Stopped; otherwise the underlying
    /// validation, resolution, persistence, or bind failure.
    pub async fn start(&self, config: AdapterConfig) -> AdapterResult<SocketAddr> {
        let _gate = self.transition.lock().await;

        {
            let state = *self.state.lock();
            if state != LifecycleState::Stopped {
                return Err(AdapterError::invalid_transition("start", state.to_string()));
            }
        }

        self.set_state(LifecycleState::Starting, None);
        info!(addr = %config.bind_addr(), target = %config.target_server_id, "starting adapter");

        match self.try_start(&config).await {
            Ok(bound_addr) => {
                self.set_state(LifecycleState::Running, None);
                info!(addr = %bound_addr, "adapter running");
                Ok(bound_addr)
            }
            Err(e) => {
                self.registry.unpin();
                *self.run.lock() = None;
                error!(error = %e, "adapter start failed");
                self.set_state(LifecycleState::Stopped, Some(e.to_string()));
                Err(e)
            }
        }
    }

    async fn try_start(&self, config: &AdapterConfig) -> AdapterResult<SocketAddr> {
        config.validate()?;

        let server = self.registry.get(&config.target_server_id)?;
        if !server.is_active {
            return Err(AdapterError::inactive(server.id.as_str()));
        }

        self.store.save_adapter_config(config).await?;

        let listener = TcpListener::bind(config.bind_addr()).await.map_err(|e| {
            AdapterError::bind(format!("cannot listen on {}: {e}", config.bind_addr()))
        })?;
        let bound_addr = listener
            .local_addr()
            .map_err(|e| AdapterError::bind(e.to_string()))?;

        self.registry.pin(&server.id)?;

        // Snapshot boundary: the backend captures the record as it is now.
        let backend = backend_for(&server, self.defaults.clone())?;
        let executor = Arc::new(RequestExecutor::new(Arc::clone(&self.registry))?);
        let router = create_router(AppState::new(backend, Arc::clone(&self.logs), executor));

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            let shutdown = async move {
                let _ = shutdown_rx.wait_for(|stop| *stop).await;
            };
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!(error = %e, "adapter server exited with error");
            }
        });

        *self.run.lock() = Some(RunHandle {
            shutdown: shutdown_tx,
            task,
            bound_addr,
        });

        Ok(bound_addr)
    }

    /// Stop the adapter, draining in-flight requests up to the grace period.
    ///
    /// # Errors
    /// `InvalidTransition` when not Running; no status event is emitted in
    /// that case.
    pub async fn stop(&self) -> AdapterResult<()> {
        let _gate = self.transition.lock().await;

        {
            let state = *self.state.lock();
            if state != LifecycleState::Running {
                return Err(AdapterError::invalid_transition("stop", state.to_string()));
            }
        }

        self.set_state(LifecycleState::Stopping, None);
        info!("stopping adapter");

        let handle = self.run.lock().take();
        if let Some(handle) = handle {
            let _ = handle.shutdown.send(true);
            let mut task = handle.task;
            if tokio::time::timeout(STOP_GRACE_PERIOD, &mut task)
                .await
                .is_err()
            {
                warn!(
                    grace_secs = STOP_GRACE_PERIOD.as_secs(),
                    "drain exceeded grace period, aborting server task"
                );
                task.abort();
            }
        }

        self.registry.unpin();
        self.set_state(LifecycleState::Stopped, None);
        info!("adapter stopped");
        Ok(())
    }

    fn set_state(&self, state: LifecycleState, last_error: Option<String>) {
        *self.state.lock() = state;
        *self.last_error.lock() = last_error;
        let _ = self.status_tx.send(self.status());
    }
}
