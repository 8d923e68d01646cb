//! # LLM Protocol Adapter
//!
//! OpenAI-compatible protocol adapter for local model-serving daemons.
//!
//! Loads the persisted backend registry and adapter configuration, starts
//! the adapter listener, and runs until interrupted.
//!
//! ## Usage
//!
//! ```bash
//! # Start with the persisted configuration
//! llm-protocol-adapter
//!
//! # Use a custom registry file
//! ADAPTER_STORE=/path/to/registry.json llm-protocol-adapter
//!
//! # Raise log verbosity
//! RUST_LOG=debug llm-protocol-adapter
//! ```

use adapter_core::GenerationDefaults;
use adapter_registry::{BackendRegistry, JsonFileStore, RegistryStore};
use adapter_server::AdapterManager;
use adapter_telemetry::{init_logging, LogChannel, LoggingConfig};
use anyhow::Context;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Application entry point
#[tokio::main]
async fn main() {
    let logs = Arc::new(LogChannel::new());

    if let Err(e) = init_logging(&LoggingConfig::new(), Some(Arc::clone(&logs))) {
        eprintln!("Failed to initialize logging: {e}");
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting LLM protocol adapter"
    );

    if let Err(e) = run(logs).await {
        error!(error = %e, "Adapter failed");
        std::process::exit(1);
    }
}

/// Main application logic
async fn run(logs: Arc<LogChannel>) -> anyhow::Result<()> {
    let store: Arc<dyn RegistryStore> = Arc::new(JsonFileStore::new(store_path()));

    let registry = Arc::new(BackendRegistry::new(Arc::clone(&store)));
    registry
        .load()
        .await
        .context("failed to load backend registry")?;

    let manager = AdapterManager::new(
        Arc::clone(&registry),
        store,
        logs,
        GenerationDefaults::default(),
    );

    let config = manager
        .persisted_config()
        .await
        .context("failed to load adapter configuration")?;

    info!(
        addr = %config.bind_addr(),
        target = %config.target_server_id,
        servers = registry.len(),
        "Configuration loaded"
    );

    let addr = manager
        .start(config)
        .await
        .context("failed to start adapter")?;
    info!(addr = %addr, "Adapter listening");

    tokio::signal::ctrl_c()
        .await
        .context("failed to install Ctrl+C handler")?;
    info!("Shutdown signal received");

    manager.stop().await.context("failed to stop adapter")?;
    Ok(())
}

/// Resolve the registry file path from the environment
fn store_path() -> PathBuf {
    env::var_os("ADAPTER_STORE")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("adapter-registry.json"))
}
