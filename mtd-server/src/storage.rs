mod memory;
mod sqlite;

pub use memory::MemoryKvStore;
pub use sqlite::SqliteKvStore;

use crate::config::{AppConfigStorage, AppConfigStorageBackend};

use std::sync::Arc;

use mtd_core::{error::StorageError, interface::kv::ArcKvStore};

pub async fn create_kv_store(config: &AppConfigStorage) -> Result<ArcKvStore, StorageError> {
    let store: ArcKvStore = match config.backend {
        AppConfigStorageBackend::Memory => Arc::new(MemoryKvStore::new()),
        AppConfigStorageBackend::Sqlite => Arc::new(SqliteKvStore::new(&config.sqlite).await?),
    };
    Ok(store)
}
