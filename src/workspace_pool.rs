use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};

use crate::constants::DEFAULT_WORKSPACE_POOL_SIZE;
use crate::workspace::Workspace;

/// Shared handle to one account's workspace. Holding the lock serializes
/// that account's interactions, so each one runs to completion.
pub type SharedWorkspace = Arc<Mutex<Workspace>>;

/// Entry in the pool with last-access tracking for LRU eviction
struct PoolEntry {
    workspace: SharedWorkspace,
    last_accessed: Instant,
}

/// In-memory workspaces keyed by account id, with LRU eviction once the
/// pool exceeds max_workspaces
#[derive(Clone)]
pub struct WorkspacePool {
    max_workspaces: usize,
    workspaces: Arc<RwLock<HashMap<String, PoolEntry>>>,
}

impl Default for WorkspacePool {
    fn default() -> Self {
        Self::new(DEFAULT_WORKSPACE_POOL_SIZE)
    }
}

impl WorkspacePool {
    pub fn new(max_workspaces: usize) -> Self {
        Self {
            max_workspaces: max_workspaces.max(1),
            workspaces: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get the workspace for an account, creating a fresh one on first use.
    /// When the pool is full, the least recently used workspace is dropped.
    pub async fn get(&self, user_id: &str) -> SharedWorkspace {
        let mut workspaces = self.workspaces.write().await;

        if let Some(entry) = workspaces.get_mut(user_id) {
            entry.last_accessed = Instant::now();
            return entry.workspace.clone();
        }

        if workspaces.len() >= self.max_workspaces {
            Self::evict_lru(&mut workspaces);
        }

        let workspace = Arc::new(Mutex::new(Workspace::new()));
        workspaces.insert(
            user_id.to_string(),
            PoolEntry {
                workspace: workspace.clone(),
                last_accessed: Instant::now(),
            },
        );
        workspace
    }

    /// Drop an account's workspace, e.g. on logout.
    pub async fn remove(&self, user_id: &str) {
        self.workspaces.write().await.remove(user_id);
    }

    pub async fn len(&self) -> usize {
        self.workspaces.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.workspaces.read().await.is_empty()
    }

    fn evict_lru(workspaces: &mut HashMap<String, PoolEntry>) {
        if let Some(oldest_key) = workspaces
            .iter()
            .min_by_key(|(_, entry)| entry.last_accessed)
            .map(|(key, _)| key.clone())
        {
            tracing::debug!(user = %oldest_key, "evicting idle workspace");
            workspaces.remove(&oldest_key);
        }
    }
}
