//! Lookup caches kept in the key-value store.
//!
//! - `DurationCache`: measured media durations, keyed by a policy-selected
//!   identifier, so repeat plays skip the duration poll.
//! - `LocationCache`: resolved absolute paths of mapped files.

use std::sync::Arc;

use serde_json::Value;

use crate::ports::{KeyValueStore, StoreError, read_json, write_json};

pub struct DurationCache {
    store: Arc<dyn KeyValueStore>,
    prefix: String,
}

impl DurationCache {
    pub fn new(store: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    pub fn key(&self, identifier: &str) -> String {
        format!("{}{}", self.prefix, identifier)
    }

    /// Known duration in milliseconds. Zero, negative or unparsable entries
    /// count as unknown.
    pub async fn get(&self, identifier: &str) -> Result<Option<u64>, StoreError> {
        let value = self.store.get(&self.key(identifier)).await?;
        Ok(value.as_ref().and_then(parse_duration).filter(|ms| *ms > 0))
    }

    pub async fn record(&self, identifier: &str, duration_ms: u64) -> Result<(), StoreError> {
        self.store
            .set(&self.key(identifier), Value::from(duration_ms))
            .await
    }
}

/// Hosts have stored durations both as numbers and as numeric strings.
fn parse_duration(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub struct LocationCache {
    store: Arc<dyn KeyValueStore>,
    prefix: String,
}

impl LocationCache {
    pub fn new(store: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    pub async fn get(&self, name: &str) -> Result<Option<String>, StoreError> {
        let path: Option<String> =
            read_json(self.store.as_ref(), &format!("{}{}", self.prefix, name)).await?;
        Ok(path.filter(|p| !p.is_empty()))
    }

    pub async fn record(&self, name: &str, path: &str) -> Result<(), StoreError> {
        write_json(self.store.as_ref(), &format!("{}{}", self.prefix, name), path).await
    }
}
