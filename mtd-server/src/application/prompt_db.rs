use crate::application::ApplicationError;

use std::sync::Arc;

use mtd_core::{interface::kv::ArcKvStore, model::prompt::PromptVersion};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::info;

pub const PROMPT_VERSIONS_KEY: &str = "prompt_versions";

/// システムプロンプトの版管理。追記専用の履歴リストで、末尾が現行版。
/// 追記は load-modify-save なので write_lock で直列化する。
#[derive(Clone)]
pub struct PromptDb {
    store: ArcKvStore,
    write_lock: Arc<Mutex<()>>,
}

impl PromptDb {
    pub fn new(store: ArcKvStore) -> PromptDb {
        PromptDb {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn list(&self) -> Result<Vec<PromptVersion>, ApplicationError> {
        self.load().await
    }

    pub async fn current(&self) -> Result<Option<PromptVersion>, ApplicationError> {
        let mut versions = self.load().await?;
        Ok(versions.pop())
    }

    pub async fn append(&self, draft: PromptDraft) -> Result<PromptVersion, ApplicationError> {
        let version = PromptVersion::new_now(draft.version, draft.content, draft.note);

        let _guard = self.write_lock.lock().await;
        let mut versions = self.load().await?;
        versions.push(version.clone());
        self.save(&versions).await?;
        info!("prompt version appended: {} ({})", version.version, version.id.0);
        Ok(version)
    }

    async fn load(&self) -> Result<Vec<PromptVersion>, ApplicationError> {
        let Some(raw) = self.store.get(PROMPT_VERSIONS_KEY).await? else {
            return Ok(vec![]);
        };
        serde_json::from_str(&raw).map_err(ApplicationError::by_serialization)
    }

    async fn save(&self, versions: &[PromptVersion]) -> Result<(), ApplicationError> {
        let raw = serde_json::to_string(versions).map_err(ApplicationError::by_serialization)?;
        self.store.set(PROMPT_VERSIONS_KEY, &raw).await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptDraft {
    pub version: String,
    pub content: String,
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKvStore;

    use std::time::Duration;

    use futures::{FutureExt, future::BoxFuture};
    use mtd_core::{error::StorageError, interface::kv::KvStore};

    fn draft(version: &str, content: &str) -> PromptDraft {
        PromptDraft {
            version: version.to_string(),
            content: content.to_string(),
            note: None,
        }
    }

    #[tokio::test]
    async fn newest_version_is_current() {
        let db = PromptDb::new(Arc::new(MemoryKvStore::new()));
        assert!(db.current().await.unwrap().is_none());

        db.append(draft("1.0.0", "最初の版")).await.unwrap();
        db.append(draft("1.1.0", "改訂版")).await.unwrap();

        let current = db.current().await.unwrap().unwrap();
        assert_eq!(current.version, "1.1.0");
        assert_eq!(db.list().await.unwrap().len(), 2);
    }

    /// set を遅らせて load と save の間の競合窓を広げるテスト用ラッパー。
    #[derive(Clone)]
    struct SlowKvStore(MemoryKvStore);

    impl KvStore for SlowKvStore {
        fn description(&self) -> String {
            "Slow Memory".to_string()
        }

        fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>> {
            self.0.get(key)
        }

        fn set<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                self.0.set(key, value).await
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn concurrent_appends_keep_both_versions() {
        let db = PromptDb::new(Arc::new(SlowKvStore(MemoryKvStore::new())));

        let (first, second) = tokio::join!(db.append(draft("1.0.0", "最初の版")), db.append(draft("1.0.1", "修正版")));
        first.unwrap();
        second.unwrap();

        assert_eq!(db.list().await.unwrap().len(), 2);
    }
}
