use std::{collections::HashMap, sync::Arc};

use futures::{FutureExt, future::BoxFuture};
use mtd_core::{error::StorageError, interface::kv::KvStore};
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct MemoryKvStore(Arc<MemoryKvStoreInner>);

impl MemoryKvStore {
    pub fn new() -> MemoryKvStore {
        MemoryKvStore(Arc::new(MemoryKvStoreInner {
            entries: Mutex::new(HashMap::new()),
        }))
    }
}

impl KvStore for MemoryKvStore {
    fn description(&self) -> String {
        "HashMap Memory".to_string()
    }

    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>> {
        async move { self.0.get(key).await }.boxed()
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        async move { self.0.set(key, value).await }.boxed()
    }
}

#[derive(Debug)]
struct MemoryKvStoreInner {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKvStoreInner {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let locked = self.entries.lock().await;
        Ok(locked.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut locked = self.entries.lock().await;
        locked.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
