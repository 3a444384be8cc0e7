//! InMemoryStore - 開発用・テスト用のグローバル変数ストア
//!
//! # 実装詳細
//! - tokio の Mutex で HashMap を保護
//! - compare_and_set はロックを 1 回取るだけなので原子的

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::Mutex;

use crate::ports::{KeyValueStore, StoreError};

#[derive(Debug, Default)]
pub struct InMemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> HashMap<String, Value> {
        self.values.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.values.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected: Option<Value>,
        new: Value,
    ) -> Result<bool, StoreError> {
        let mut values = self.values.lock().await;
        if values.get(key) != expected.as_ref() {
            return Ok(false);
        }
        values.insert(key.to_string(), new);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_set_roundtrip() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);
        store.set("k", json!([1, 2])).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!([1, 2])));
    }

    #[tokio::test]
    async fn test_compare_and_set_checks_current_value() {
        let store = InMemoryStore::new();
        assert!(store.compare_and_set("flag", None, json!(true)).await.unwrap());
        assert!(!store.compare_and_set("flag", None, json!(true)).await.unwrap());
        assert!(!store
            .compare_and_set("flag", Some(json!(false)), json!(true))
            .await
            .unwrap());
        assert!(store
            .compare_and_set("flag", Some(json!(true)), json!(false))
            .await
            .unwrap());
        assert_eq!(store.get("flag").await.unwrap(), Some(json!(false)));
    }
}
