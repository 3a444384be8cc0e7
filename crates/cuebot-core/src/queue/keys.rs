//! Storage key names for everything the player persists.
//!
//! Defaults keep the global variable names the host scripts have always used,
//! so an existing host setup keeps its queue, history and measured durations.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreKeys {
    /// Busy flag of the single-flight player.
    pub status: String,
    /// Pending `MediaJob` list.
    pub queue: String,
    /// Played `MediaJob` list.
    pub history: String,
    /// Prefix for measured durations, main folder.
    pub duration_prefix: String,
    /// Prefix for measured durations, channel-point folder.
    pub cp_duration_prefix: String,
    /// Prefix for resolved mapped file paths, main folder.
    pub location_prefix: String,
    /// Prefix for resolved mapped file paths, channel-point folder.
    pub cp_location_prefix: String,
}

impl Default for StoreKeys {
    fn default() -> Self {
        Self {
            status: "DMFL_STATUS_NOW_PLAYING".to_string(),
            queue: "DMFL_CURRENT_QUEUE".to_string(),
            history: "DMFL_LASTPLAYED_QUEUE".to_string(),
            duration_prefix: "DMFL_FILE_DURATION_".to_string(),
            cp_duration_prefix: "DMFL_CP_FILE_DURATION_".to_string(),
            location_prefix: "DMFL_FILE_LOC_".to_string(),
            cp_location_prefix: "DMFL_CP_FILE_LOC_".to_string(),
        }
    }
}

impl StoreKeys {
    pub fn duration_prefix(&self, channel_point_folder: bool) -> &str {
        if channel_point_folder {
            &self.cp_duration_prefix
        } else {
            &self.duration_prefix
        }
    }

    pub fn location_prefix(&self, channel_point_folder: bool) -> &str {
        if channel_point_folder {
            &self.cp_location_prefix
        } else {
            &self.location_prefix
        }
    }
}
