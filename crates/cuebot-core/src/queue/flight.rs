//! Single-flight busy flag.
//!
//! The flag lives in the shared key-value store so overlapping invocations
//! (two redemptions firing close together) see each other. Acquisition is a
//! compare-and-set, so two invocations that both read "not busy" cannot both
//! win.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::ports::{KeyValueStore, StoreError};

/// A stored flag counts as set when it is `true` or a non-zero number
/// (older host setups stored 0/1).
fn is_set(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    }
}

pub struct SingleFlight {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl SingleFlight {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub async fn is_busy(&self) -> Result<bool, StoreError> {
        let value = self.store.get(&self.key).await?;
        Ok(is_set(value.as_ref()))
    }

    /// Take the flag. `None` means another invocation holds it.
    pub async fn try_acquire(&self) -> Result<Option<FlightGuard>, StoreError> {
        let current = self.store.get(&self.key).await?;
        if is_set(current.as_ref()) {
            return Ok(None);
        }
        let swapped = self
            .store
            .compare_and_set(&self.key, current, Value::Bool(true))
            .await?;
        if !swapped {
            debug!(key = %self.key, "lost busy flag race");
            return Ok(None);
        }
        Ok(Some(FlightGuard {
            store: Arc::clone(&self.store),
            key: self.key.clone(),
            released: false,
        }))
    }
}

/// Proof that this invocation holds the busy flag.
///
/// Must be consumed with `release`; the store cannot be written from `Drop`,
/// so dropping an unreleased guard only logs.
pub struct FlightGuard {
    store: Arc<dyn KeyValueStore>,
    key: String,
    released: bool,
}

impl FlightGuard {
    /// Clear the flag. Writing `false` is idempotent.
    pub async fn release(mut self) -> Result<(), StoreError> {
        self.released = true;
        self.store.set(&self.key, Value::Bool(false)).await
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        if !self.released {
            warn!(key = %self.key, "busy flag guard dropped without release");
        }
    }
}
