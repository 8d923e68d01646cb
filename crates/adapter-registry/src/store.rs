//! Persistence collaborator for registry records and the adapter config.
//!
//! The adapter only validates and consumes these records; this trait is the
//! boundary behind which the on-disk format lives. The JSON file store is
//! the production implementation, the memory store backs tests.

use crate::server::BackendServer;
use adapter_core::{AdapterConfig, AdapterError, AdapterResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Async persistence boundary for servers and the adapter config record
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Load all persisted server records
    async fn load_servers(&self) -> AdapterResult<Vec<BackendServer>>;

    /// Replace all persisted server records
    async fn save_servers(&self, servers: &[BackendServer]) -> AdapterResult<()>;

    /// Load the adapter config record, if one has been saved
    async fn load_adapter_config(&self) -> AdapterResult<Option<AdapterConfig>>;

    /// Replace the adapter config record
    async fn save_adapter_config(&self, config: &AdapterConfig) -> AdapterResult<()>;
}

/// On-disk document layout of the JSON file store
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    servers: Vec<BackendServer>,
    #[serde(default)]
    adapter_config: Option<AdapterConfig>,
}

/// Single-file JSON persistence
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles on the file.
    io: Mutex<()>,
}

impl JsonFileStore {
    /// Create a store backed by the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            io: Mutex::new(()),
        }
    }

    /// The file path this store writes to
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> AdapterResult<StoreDocument> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| AdapterError::store(format!("malformed store file: {e}"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoreDocument::default()),
            Err(e) => Err(AdapterError::store(format!("failed to read store: {e}"))),
        }
    }

    async fn write_document(&self, doc: &StoreDocument) -> AdapterResult<()> {
        let bytes = serde_json::to_vec_pretty(doc)
            .map_err(|e| AdapterError::store(format!("failed to serialize store: {e}")))?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AdapterError::store(format!("failed to create store dir: {e}")))?;
        }
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|e| AdapterError::store(format!("failed to write store: {e}")))
    }
}

#[async_trait]
impl RegistryStore for JsonFileStore {
    async fn load_servers(&self) -> AdapterResult<Vec<BackendServer>> {
        let _guard = self.io.lock().await;
        Ok(self.read_document().await?.servers)
    }

    async fn save_servers(&self, servers: &[BackendServer]) -> AdapterResult<()> {
        let _guard = self.io.lock().await;
        let mut doc = self.read_document().await?;
        doc.servers = servers.to_vec();
        self.write_document(&doc).await
    }

    async fn load_adapter_config(&self) -> AdapterResult<Option<AdapterConfig>> {
        let _guard = self.io.lock().await;
        Ok(self.read_document().await?.adapter_config)
    }

    async fn save_adapter_config(&self, config: &AdapterConfig) -> AdapterResult<()> {
        let _guard = self.io.lock().await;
        let mut doc = self.read_document().await?;
        doc.adapter_config = Some(config.clone());
        self.write_document(&doc).await
    }
}

/// In-memory store for tests
#[derive(Default)]
pub struct MemoryStore {
    servers: Mutex<Vec<BackendServer>>,
    config: Mutex<Option<AdapterConfig>>,
}

impl MemoryStore {
    /// Create an empty memory store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RegistryStore for MemoryStore {
    async fn load_servers(&self) -> AdapterResult<Vec<BackendServer>> {
        Ok(self.servers.lock().await.clone())
    }

    async fn save_servers(&self, servers: &[BackendServer]) -> AdapterResult<()> {
        *self.servers.lock().await = servers.to_vec();
        Ok(())
    }

    async fn load_adapter_config(&self) -> AdapterResult<Option<AdapterConfig>> {
        Ok(self.config.lock().await.clone())
    }

    async fn save_adapter_config(&self, config: &AdapterConfig) -> AdapterResult<()> {
        *self.config.lock().await = Some(config.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapter_core::ServerId;

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("registry.json"));

        assert!(store.load_servers().await.expect("load").is_empty());
        assert!(store.load_adapter_config().await.expect("load").is_none());
    }

    #[tokio::test]
    async fn servers_round_trip_through_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("registry.json"));

        let servers = vec![
            BackendServer::new("local", "http://127.0.0.1:11434"),
            BackendServer::new("remote", "http://10.0.0.2:11434").with_api_key("k"),
        ];
        store.save_servers(&servers).await.expect("save");

        let loaded = store.load_servers().await.expect("load");
        assert_eq!(loaded, servers);
    }

    #[tokio::test]
    async fn config_save_preserves_servers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("registry.json"));

        let servers = vec![BackendServer::new("local", "http://127.0.0.1:11434")];
        store.save_servers(&servers).await.expect("save servers");

        let config = AdapterConfig::new("127.0.0.1", 11223, ServerId::new("s"));
        store.save_adapter_config(&config).await.expect("save config");

        assert_eq!(store.load_servers().await.expect("load"), servers);
        assert_eq!(
            store.load_adapter_config().await.expect("load"),
            Some(config)
        );
    }

    #[tokio::test]
    async fn malformed_file_is_a_store_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("registry.json");
        tokio::fs::write(&path, b"not json").await.expect("write");

        let store = JsonFileStore::new(&path);
        assert!(matches!(
            store.load_servers().await,
            Err(AdapterError::Store { .. })
        ));
    }
}
