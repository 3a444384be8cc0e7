//! KeyValueStore port - ホストのグローバル変数
//!
//! BusyFlag / PlaybackQueue / PlaybackHistory / DurationCache はすべて
//! このストアに JSON 値として保存されます。部分更新 API はなく、
//! リストはスナップショット単位で読み書きします。

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read store: {0}")]
    Read(String),

    #[error("failed to write store: {0}")]
    Write(String),

    #[error("value under {key} is malformed: {message}")]
    Malformed { key: String, message: String },
}

/// KeyValueStore はホストのグローバル変数ストア
///
/// # 設計原則
/// - `get` / `set` は単純な読み書き
/// - `compare_and_set` は BusyFlag の read-then-set 競合を塞ぐための原子的操作
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Replace the value under `key` with `new` only if the current value
    /// equals `expected` (`None` meaning "absent"). Returns whether it swapped.
    async fn compare_and_set(
        &self,
        key: &str,
        expected: Option<Value>,
        new: Value,
    ) -> Result<bool, StoreError>;
}

/// Read and decode a typed value.
pub async fn read_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    let Some(value) = store.get(key).await? else {
        return Ok(None);
    };
    serde_json::from_value(value)
        .map(Some)
        .map_err(|e| StoreError::Malformed {
            key: key.to_string(),
            message: e.to_string(),
        })
}

/// Encode and write a typed value.
pub async fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let value = serde_json::to_value(value).map_err(|e| StoreError::Malformed {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    store.set(key, value).await
}
