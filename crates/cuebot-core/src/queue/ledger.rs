//! Persisted playback queue and history.
//!
//! Both lists are stored as whole JSON snapshots under their own keys and are
//! rewritten on every mutation. Mutations happen only while the busy flag is
//! held, which is what keeps the read-modify-write cycles from interleaving.

use std::sync::Arc;

use tracing::debug;

use crate::domain::MediaJob;
use crate::ports::{KeyValueStore, StoreError, read_json, write_json};

pub struct PlaybackLedger {
    store: Arc<dyn KeyValueStore>,
    queue_key: String,
    history_key: String,
    history_limit: Option<usize>,
}

impl PlaybackLedger {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        queue_key: impl Into<String>,
        history_key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            queue_key: queue_key.into(),
            history_key: history_key.into(),
            history_limit: None,
        }
    }

    /// Keep at most `limit` history entries, dropping the oldest.
    pub fn with_history_limit(mut self, limit: Option<usize>) -> Self {
        self.history_limit = limit;
        self
    }

    /// Write empty lists for keys that have never been set.
    pub async fn ensure_initialized(&self) -> Result<(), StoreError> {
        for key in [&self.queue_key, &self.history_key] {
            if self.store.get(key).await?.is_none() {
                write_json(self.store.as_ref(), key, &Vec::<MediaJob>::new()).await?;
            }
        }
        Ok(())
    }

    pub async fn queue(&self) -> Result<Vec<MediaJob>, StoreError> {
        self.load(&self.queue_key).await
    }

    pub async fn history(&self) -> Result<Vec<MediaJob>, StoreError> {
        self.load(&self.history_key).await
    }

    /// Append jobs at the tail. Returns the new queue length.
    pub async fn enqueue(&self, jobs: &[MediaJob]) -> Result<usize, StoreError> {
        let mut queue = self.queue().await?;
        queue.extend_from_slice(jobs);
        write_json(self.store.as_ref(), &self.queue_key, &queue).await?;
        debug!(added = jobs.len(), queued = queue.len(), "jobs enqueued");
        Ok(queue.len())
    }

    /// Remove and return the head of the queue.
    pub async fn pop_front(&self) -> Result<Option<MediaJob>, StoreError> {
        let mut queue = self.queue().await?;
        if queue.is_empty() {
            return Ok(None);
        }
        let job = queue.remove(0);
        write_json(self.store.as_ref(), &self.queue_key, &queue).await?;
        Ok(Some(job))
    }

    pub async fn record_played(&self, job: &MediaJob) -> Result<(), StoreError> {
        let mut history = self.history().await?;
        history.push(job.clone());
        if let Some(limit) = self.history_limit
            && history.len() > limit
        {
            let excess = history.len() - limit;
            history.drain(..excess);
        }
        write_json(self.store.as_ref(), &self.history_key, &history).await
    }

    async fn load(&self, key: &str) -> Result<Vec<MediaJob>, StoreError> {
        Ok(read_json(self.store.as_ref(), key).await?.unwrap_or_default())
    }
}
