use crate::config::AppConfigStorageSqlite;

use futures::{FutureExt, TryFutureExt, future::BoxFuture};
use mtd_core::{error::StorageError, interface::kv::KvStore};
use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct SqliteKvStore {
    pool: SqlitePool,
}

impl SqliteKvStore {
    pub async fn new(config: &AppConfigStorageSqlite) -> Result<SqliteKvStore, StorageError> {
        let pool = SqlitePool::connect(&config.filepath.to_string_lossy())
            .map_err(StorageError::by_backend)
            .await?;
        sqlx::query(r#"CREATE TABLE IF NOT EXISTS kv_entries (key TEXT PRIMARY KEY, value TEXT NOT NULL);"#)
            .execute(&pool)
            .map_err(StorageError::by_backend)
            .await?;
        Ok(SqliteKvStore { pool })
    }

    async fn get_value(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row: Option<(String,)> = sqlx::query_as(r#"SELECT value FROM kv_entries WHERE key = ?;"#)
            .bind(key)
            .fetch_optional(&self.pool)
            .map_err(StorageError::by_backend)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn set_value(&self, key: &str, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO kv_entries (key, value) VALUES (?, ?)
            ON CONFLICT DO UPDATE SET value = excluded.value;
        "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .map_err(StorageError::by_backend)
        .await?;
        Ok(())
    }
}

impl KvStore for SqliteKvStore {
    fn description(&self) -> String {
        "SQLite".to_string()
    }

    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>> {
        async move { self.get_value(key).await }.boxed()
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        async move { self.set_value(key, value).await }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;

    async fn in_memory_store() -> SqliteKvStore {
        let config = AppConfigStorageSqlite {
            filepath: PathBuf::from("sqlite::memory:"),
        };
        SqliteKvStore::new(&config).await.unwrap()
    }

    #[tokio::test]
    async fn set_overwrites_existing_value() {
        let store = in_memory_store().await;

        assert_eq!(store.get_value("missing").await.unwrap(), None);

        store.set_value("llm_configs", "[]").await.unwrap();
        store.set_value("llm_configs", "[{}]").await.unwrap();
        assert_eq!(store.get_value("llm_configs").await.unwrap().as_deref(), Some("[{}]"));
    }
}
