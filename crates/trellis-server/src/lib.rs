//! HTTP server exposing sync, tree and canvas endpoints

pub mod router;
pub mod handlers;

use std::path::Path;
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use trellis_core::GraphStore;
use trellis_indexer::{Scanner, workspace_name};

/// Identity a sync serializes on: the project and the workspace name, the
/// same pair that selects the service node.
pub type SyncKey = (String, String);

/// Shared state behind every handler.
pub struct ServerState {
    pub store: Arc<dyn GraphStore>,
    pub scanner: Scanner,
    /// Locks of syncs in flight. An entry lives only while some sync holds or
    /// waits on it.
    sync_locks: DashMap<SyncKey, Arc<Mutex<()>>>,
}

impl ServerState {
    pub fn new(store: Arc<dyn GraphStore>, scanner: Scanner) -> Self {
        Self {
            store,
            scanner,
            sync_locks: DashMap::new(),
        }
    }

    pub fn sync_key(&self, project_id: &str, workspace_path: &Path) -> SyncKey {
        let resolved = workspace_path
            .canonicalize()
            .unwrap_or_else(|_| workspace_path.to_path_buf());
        (project_id.to_string(), workspace_name(&resolved))
    }

    /// The lock serializing syncs under `key`.
    pub fn sync_lock(&self, key: &SyncKey) -> Arc<Mutex<()>> {
        self.sync_locks.entry(key.clone()).or_default().clone()
    }

    /// Drop the entry for `key` once nobody but the map holds its lock.
    pub fn release_sync_lock(&self, key: &SyncKey) {
        self.sync_locks
            .remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Run `f` while holding the sync lock of (project, workspace).
    /// `None` if the lock was poisoned by a panicking sync.
    pub fn with_sync_lock<T>(
        &self,
        project_id: &str,
        workspace_path: &Path,
        f: impl FnOnce() -> T,
    ) -> Option<T> {
        let key = self.sync_key(project_id, workspace_path);
        let result = {
            let lock = self.sync_lock(&key);
            let guard = lock.lock().ok();
            guard.map(|_guard| f())
        };
        self.release_sync_lock(&key);
        result
    }

    /// Number of sync locks currently tracked.
    pub fn sync_lock_count(&self) -> usize {
        self.sync_locks.len()
    }
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7890,
        }
    }
}

/// Main server struct
pub struct TrellisServer {
    state: Arc<ServerState>,
    config: ServerConfig,
}

impl TrellisServer {
    pub fn new(state: ServerState, config: ServerConfig) -> Self {
        Self {
            state: Arc::new(state),
            config,
        }
    }

    /// Get a reference to the shared state
    pub fn state(&self) -> Arc<ServerState> {
        Arc::clone(&self.state)
    }

    /// Start the server
    pub async fn start(self) -> anyhow::Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        tracing::info!("Server listening on http://{}", addr);

        let app = router::create_router(self.state);
        axum::serve(listener, app).await?;

        Ok(())
    }
}
