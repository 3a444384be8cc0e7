use serde::{Deserialize, Serialize};

use crate::domain::MediaJob;

/// Point-in-time view of the persisted playback state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub busy: bool,
    pub queued: Vec<MediaJob>,
    pub history_len: usize,
    pub last_played: Option<MediaJob>,
}

impl QueueStatus {
    pub fn new(busy: bool, queued: Vec<MediaJob>, history: &[MediaJob]) -> Self {
        Self {
            busy,
            queued,
            history_len: history.len(),
            last_played: history.last().cloned(),
        }
    }
}
