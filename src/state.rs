use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::{MemoryStore, Store};

/// Shared handler context; cloned per request
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: AppConfig) -> Self {
        Self { store, config: Arc::new(config) }
    }

    /// Fresh empty in-memory store with development settings
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), AppConfig::in_memory())
    }
}
