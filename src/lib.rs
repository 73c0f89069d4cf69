pub mod auth;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod error;
pub mod file_api;
pub mod file_store;
pub mod models;
pub mod remote_store;
pub mod repository;
pub mod router;
pub mod summary;
pub mod supabase;
pub mod timer;
pub mod timer_records;
pub mod transactions;
pub mod utils;
pub mod workspace;
pub mod workspace_pool;

use std::sync::Arc;

use axum::extract::FromRef;

// Re-export types at crate root for convenient importing
pub use crate::config::Config;
pub use crate::error::{AppError, StoreError};
pub use crate::file_store::JsonFileStore;
pub use crate::remote_store::RemoteTable;
pub use crate::repository::{TimerRecords, Transactions};
pub use crate::supabase::SupabaseClient;
pub use crate::timer::{Clock, MonotonicClock};
pub use crate::workspace_pool::WorkspacePool;

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Auth provider and table gateway
    pub supabase: SupabaseClient,
    pub timer_records: RemoteTable<TimerRecords>,
    pub transactions: RemoteTable<Transactions>,
    /// Local JSON documents behind the file-backed API
    pub timer_record_files: JsonFileStore<TimerRecords>,
    pub transaction_files: JsonFileStore<Transactions>,
    /// Per-account tabs, dialogs and timers
    pub workspaces: WorkspacePool,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, StoreError> {
        let supabase = SupabaseClient::new(&config.supabase_url, config.supabase_anon_key.clone())?;
        Ok(Self {
            timer_records: RemoteTable::new(supabase.clone()),
            transactions: RemoteTable::new(supabase.clone()),
            supabase,
            timer_record_files: JsonFileStore::new(&config.data_path),
            transaction_files: JsonFileStore::new(&config.data_path),
            workspaces: WorkspacePool::new(config.workspace_pool_size),
            clock: Arc::new(MonotonicClock::new()),
        })
    }

    /// Replaces the clock that drives the session timers.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl FromRef<AppState> for JsonFileStore<TimerRecords> {
    fn from_ref(state: &AppState) -> Self {
        state.timer_record_files.clone()
    }
}

impl FromRef<AppState> for JsonFileStore<Transactions> {
    fn from_ref(state: &AppState) -> Self {
        state.transaction_files.clone()
    }
}
