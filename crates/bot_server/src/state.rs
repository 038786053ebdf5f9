use std::path::PathBuf;
use std::sync::Arc;

use bot_core::{StoreError, UserStore};
use bot_storage::{FileStore, MemoryStore};

use crate::dispatch::Dispatcher;

/// Which store backs the server.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum StorageBackend {
    Memory,
    File,
}

pub struct AppState {
    pub dispatcher: Dispatcher,
    pub store: Arc<dyn UserStore>,
}

impl AppState {
    pub async fn new(
        backend: StorageBackend,
        data_dir: Option<PathBuf>,
    ) -> Result<Self, StoreError> {
        let store: Arc<dyn UserStore> = match backend {
            StorageBackend::Memory => {
                log::info!("Using in-memory user store");
                Arc::new(MemoryStore::new())
            }
            StorageBackend::File => {
                let data_dir = data_dir.unwrap_or_else(default_data_dir);
                Arc::new(FileStore::init(data_dir).await?)
            }
        };

        Ok(Self {
            dispatcher: Dispatcher::new(Arc::clone(&store)),
            store,
        })
    }

    /// Ephemeral state for tests.
    pub fn in_memory() -> Self {
        let store: Arc<dyn UserStore> = Arc::new(MemoryStore::new());
        Self {
            dispatcher: Dispatcher::new(Arc::clone(&store)),
            store,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".chatbot")
}
