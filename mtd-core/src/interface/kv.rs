use crate::error::StorageError;

use std::sync::Arc;

use futures::future::BoxFuture;

pub type ArcKvStore = Arc<dyn KvStore + 'static>;

/// localStorage 相当の key-value 永続化層の抽象化。
/// 値はすべて文字列で、構造を持つものは JSON で格納する。
pub trait KvStore: Send + Sync {
    fn description(&self) -> String;

    /// key に対応する値を取得する。未登録なら `None`。
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>>;

    /// key に値を書き込む。既存の値は上書きされる。
    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), StorageError>>;
}
