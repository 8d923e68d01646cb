//! In-memory backend registry with pinned-target protection.

use crate::server::BackendServer;
use crate::store::RegistryStore;
use adapter_core::{AdapterError, AdapterResult, ServerId};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

/// Holds the known backend servers and which one is currently selected.
///
/// Mutations go through the persistence store; reads are served from
/// memory. The lifecycle manager pins the target id while the adapter is
/// running, which blocks deletion and deactivation of that record and
/// moving the selection off it.
pub struct BackendRegistry {
    servers: Mutex<Vec<BackendServer>>,
    selected: Mutex<Option<ServerId>>,
    pinned: Mutex<Option<ServerId>>,
    // Serializes each mutation with its save, so the store always
    // receives snapshots in mutation order.
    write_gate: tokio::sync::Mutex<()>,
    store: Arc<dyn RegistryStore>,
}

impl BackendRegistry {
    /// Create an empty registry over the given store
    pub fn new(store: Arc<dyn RegistryStore>) -> Self {
        Self {
            servers: Mutex::new(Vec::new()),
            selected: Mutex::new(None),
            pinned: Mutex::new(None),
            write_gate: tokio::sync::Mutex::new(()),
            store,
        }
    }

    /// Populate the registry from the store
    pub async fn load(&self) -> AdapterResult<()> {
        let servers = self.store.load_servers().await?;
        info!(count = servers.len(), "loaded backend servers");
        *self.servers.lock() = servers;
        Ok(())
    }

    /// All known servers, in insertion order
    #[must_use]
    pub fn list(&self) -> Vec<BackendServer> {
        self.servers.lock().clone()
    }

    /// Resolve a server by id
    ///
    /// # Errors
    /// Returns [`AdapterError::NotFound`] when the id does not resolve.
    pub fn get(&self, id: &ServerId) -> AdapterResult<BackendServer> {
        self.servers
            .lock()
            .iter()
            .find(|s| &s.id == id)
            .cloned()
            .ok_or_else(|| AdapterError::not_found(id.as_str()))
    }

    /// Add a new server record and persist
    pub async fn add(&self, server: BackendServer) -> AdapterResult<()> {
        let _write = self.write_gate.lock().await;
        let snapshot = {
            let mut servers = self.servers.lock();
            if servers.iter().any(|s| s.id == server.id) {
                return Err(AdapterError::validation(
                    format!("server id already exists: {}", server.id),
                    Some("id".to_string()),
                ));
            }
            debug!(id = %server.id, name = %server.display_name, "adding backend server");
            servers.push(server);
            servers.clone()
        };
        self.store.save_servers(&snapshot).await
    }

    /// Update an existing record and persist.
    ///
    /// Deactivating the currently pinned target is rejected; the running
    /// adapter keeps the snapshot it captured at start and must be stopped
    /// before its target can be disabled.
    pub async fn update(&self, server: BackendServer) -> AdapterResult<()> {
        let _write = self.write_gate.lock().await;
        if !server.is_active && self.is_pinned(&server.id) {
            return Err(AdapterError::invalid_transition(
                format!("deactivate target server {}", server.id),
                "running",
            ));
        }

        let snapshot = {
            let mut servers = self.servers.lock();
            let slot = servers
                .iter_mut()
                .find(|s| s.id == server.id)
                .ok_or_else(|| AdapterError::not_found(server.id.as_str()))?;
            *slot = server;
            servers.clone()
        };
        self.store.save_servers(&snapshot).await
    }

    /// Delete a record and persist.
    ///
    /// Deleting the currently pinned target is rejected.
    pub async fn delete(&self, id: &ServerId) -> AdapterResult<()> {
        let _write = self.write_gate.lock().await;
        if self.is_pinned(id) {
            return Err(AdapterError::invalid_transition(
                format!("delete target server {id}"),
                "running",
            ));
        }

        let snapshot = {
            let mut servers = self.servers.lock();
            let before = servers.len();
            servers.retain(|s| &s.id != id);
            if servers.len() == before {
                return Err(AdapterError::not_found(id.as_str()));
            }
            servers.clone()
        };

        let mut selected = self.selected.lock();
        if selected.as_ref() == Some(id) {
            *selected = None;
        }
        drop(selected);

        self.store.save_servers(&snapshot).await
    }

    /// Record the result of a connectivity probe and persist
    pub async fn update_test_status(
        &self,
        id: &ServerId,
        status: impl Into<String>,
    ) -> AdapterResult<()> {
        let _write = self.write_gate.lock().await;
        let snapshot = {
            let mut servers = self.servers.lock();
            let slot = servers
                .iter_mut()
                .find(|s| &s.id == id)
                .ok_or_else(|| AdapterError::not_found(id.as_str()))?;
            slot.test_status = Some(status.into());
            servers.clone()
        };
        self.store.save_servers(&snapshot).await
    }

    /// Select a server as the translation target.
    ///
    /// # Errors
    /// `NotFound` when the id does not resolve; `Inactive` when the server
    /// is administratively disabled; `InvalidTransition` when the selection
    /// would move off the pinned target while the adapter is running.
    pub fn set_selected(&self, id: &ServerId) -> AdapterResult<()> {
        let server = self.get(id)?;
        if !server.is_active {
            return Err(AdapterError::inactive(id.as_str()));
        }
        if let Some(pinned) = self.pinned.lock().as_ref() {
            if pinned != id {
                return Err(AdapterError::invalid_transition(
                    format!("select server {id} while target {pinned} is pinned"),
                    "running",
                ));
            }
        }
        *self.selected.lock() = Some(id.clone());
        Ok(())
    }

    /// The currently selected target, if any
    #[must_use]
    pub fn selected(&self) -> Option<ServerId> {
        self.selected.lock().clone()
    }

    /// Pin a target id for the duration of a run.
    ///
    /// # Errors
    /// `Internal` if a pin is already held. Transitions are serialized, so
    /// this indicates lifecycle misuse.
    pub fn pin(&self, id: &ServerId) -> AdapterResult<()> {
        let mut pinned = self.pinned.lock();
        if let Some(existing) = pinned.as_ref() {
            return Err(AdapterError::internal(format!(
                "target already pinned: {existing}"
            )));
        }
        *pinned = Some(id.clone());
        Ok(())
    }

    /// Release the pin taken at start
    pub fn unpin(&self) {
        *self.pinned.lock() = None;
    }

    /// The currently pinned target, if the adapter is running
    #[must_use]
    pub fn pinned(&self) -> Option<ServerId> {
        self.pinned.lock().clone()
    }

    fn is_pinned(&self, id: &ServerId) -> bool {
        self.pinned.lock().as_ref() == Some(id)
    }

    /// Number of known servers
    #[must_use]
    pub fn len(&self) -> usize {
        self.servers.lock().len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.servers.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn registry() -> BackendRegistry {
        BackendRegistry::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn add_get_list_round_trip() {
        let registry = registry();
        let server = BackendServer::new("local", "http://127.0.0.1:11434");
        let id = server.id.clone();

        registry.add(server).await.expect("add");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&id).expect("get").display_name, "local");
    }

    #[tokio::test]
    async fn get_unknown_is_not_found() {
        let registry = registry();
        assert!(matches!(
            registry.get(&ServerId::new("ghost")),
            Err(AdapterError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() {
        let registry = registry();
        let server = BackendServer::new("local", "http://127.0.0.1:11434");
        registry.add(server.clone()).await.expect("add");
        assert!(registry.add(server).await.is_err());
    }

    #[tokio::test]
    async fn selecting_inactive_server_fails() {
        let registry = registry();
        let mut server = BackendServer::new("off", "http://127.0.0.1:11434");
        server.is_active = false;
        let id = server.id.clone();
        registry.add(server).await.expect("add");

        assert!(matches!(
            registry.set_selected(&id),
            Err(AdapterError::Inactive { .. })
        ));
        assert_eq!(registry.selected(), None);
    }

    #[tokio::test]
    async fn deleting_pinned_target_is_rejected() {
        let registry = registry();
        let server = BackendServer::new("local", "http://127.0.0.1:11434");
        let id = server.id.clone();
        registry.add(server).await.expect("add");
        registry.pin(&id).expect("pin");

        assert!(matches!(
            registry.delete(&id).await,
            Err(AdapterError::InvalidTransition { .. })
        ));
        assert_eq!(registry.len(), 1);

        registry.unpin();
        registry.delete(&id).await.expect("delete after unpin");
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn selecting_away_from_pinned_target_is_rejected() {
        let registry = registry();
        let a = BackendServer::new("a", "http://127.0.0.1:11434");
        let b = BackendServer::new("b", "http://127.0.0.1:11435");
        let (a_id, b_id) = (a.id.clone(), b.id.clone());
        registry.add(a).await.expect("add a");
        registry.add(b).await.expect("add b");
        registry.set_selected(&a_id).expect("select a");
        registry.pin(&a_id).expect("pin");

        assert!(matches!(
            registry.set_selected(&b_id),
            Err(AdapterError::InvalidTransition { .. })
        ));
        assert_eq!(registry.selected(), Some(a_id.clone()));

        // Re-selecting the pinned target itself stays allowed.
        registry.set_selected(&a_id).expect("reselect pinned");

        registry.unpin();
        registry.set_selected(&b_id).expect("select after unpin");
        assert_eq!(registry.selected(), Some(b_id));
    }

    #[tokio::test]
    async fn deactivating_pinned_target_is_rejected() {
        let registry = registry();
        let server = BackendServer::new("local", "http://127.0.0.1:11434");
        let id = server.id.clone();
        registry.add(server.clone()).await.expect("add");
        registry.pin(&id).expect("pin");

        let mut disabled = server.clone();
        disabled.is_active = false;
        assert!(matches!(
            registry.update(disabled).await,
            Err(AdapterError::InvalidTransition { .. })
        ));

        // Renames on the pinned record stay allowed; the running adapter
        // serves its start-time snapshot either way.
        let mut renamed = server;
        renamed.display_name = "renamed".to_string();
        registry.update(renamed).await.expect("rename");
    }

    #[tokio::test]
    async fn double_pin_is_an_internal_error() {
        let registry = registry();
        let server = BackendServer::new("local", "http://127.0.0.1:11434");
        let id = server.id.clone();
        registry.add(server).await.expect("add");

        registry.pin(&id).expect("pin");
        assert!(matches!(
            registry.pin(&id),
            Err(AdapterError::Internal { .. })
        ));
    }

    #[tokio::test]
    async fn deleting_selected_server_clears_selection() {
        let registry = registry();
        let server = BackendServer::new("local", "http://127.0.0.1:11434");
        let id = server.id.clone();
        registry.add(server).await.expect("add");
        registry.set_selected(&id).expect("select");

        registry.delete(&id).await.expect("delete");
        assert_eq!(registry.selected(), None);
    }

    #[tokio::test]
    async fn concurrent_mutations_persist_the_final_snapshot() {
        let store = Arc::new(MemoryStore::new());
        let registry = Arc::new(BackendRegistry::new(
            Arc::clone(&store) as Arc<dyn RegistryStore>
        ));

        let seed = BackendServer::new("seed", "http://127.0.0.1:11434");
        let seed_id = seed.id.clone();
        registry.add(seed).await.expect("seed");

        let adder = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                registry
                    .add(BackendServer::new("late", "http://127.0.0.1:11435"))
                    .await
            })
        };
        let status = {
            let registry = Arc::clone(&registry);
            let id = seed_id.clone();
            tokio::spawn(async move { registry.update_test_status(&id, "ok (3ms)").await })
        };
        adder.await.expect("join").expect("add");
        status.await.expect("join").expect("status");

        // The store holds what memory holds, whatever order the two
        // mutations landed in.
        let reloaded = BackendRegistry::new(store);
        reloaded.load().await.expect("load");
        assert_eq!(reloaded.len(), 2);
        assert_eq!(
            reloaded.get(&seed_id).expect("get").test_status.as_deref(),
            Some("ok (3ms)")
        );
    }

    #[tokio::test]
    async fn mutations_persist_through_the_store() {
        let store = Arc::new(MemoryStore::new());
        let registry = BackendRegistry::new(Arc::clone(&store) as Arc<dyn RegistryStore>);

        let server = BackendServer::new("local", "http://127.0.0.1:11434");
        let id = server.id.clone();
        registry.add(server).await.expect("add");
        registry
            .update_test_status(&id, "ok (12ms)")
            .await
            .expect("status");

        let reloaded = BackendRegistry::new(store);
        reloaded.load().await.expect("load");
        assert_eq!(
            reloaded.get(&id).expect("get").test_status.as_deref(),
            Some("ok (12ms)")
        );
    }
}
