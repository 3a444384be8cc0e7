//! Media jobs and the triggers that create them.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// One enqueued unit of playback.
///
/// Stored as a JSON object in the persisted queue and history lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaJob {
    pub display_name: String,
    pub file_path: String,
}

impl MediaJob {
    pub fn new(display_name: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            file_path: file_path.into(),
        }
    }

    /// Build a job for a file found on disk; the display name is the bare file name.
    pub fn from_path(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?.to_string();
        if file_name.is_empty() {
            return None;
        }
        Some(Self::new(file_name, path.to_string_lossy()))
    }

    /// File name component of `file_path`, falling back to the whole path.
    pub fn file_name(&self) -> &str {
        Path::new(&self.file_path)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.file_path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerKind {
    /// A viewer spent channel points on a reward.
    RewardRedemption,
    /// A viewer typed a recognized chat command.
    TypedCommand,
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerKind::RewardRedemption => f.write_str("reward"),
            TriggerKind::TypedCommand => f.write_str("command"),
        }
    }
}

/// Event payload handed over by the host runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    pub kind: TriggerKind,
    /// Reward title or command name.
    pub name: String,
    /// Free text typed after a command; absent for redemptions.
    pub raw_input: Option<String>,
}

impl Trigger {
    pub fn reward(name: impl Into<String>) -> Self {
        Self {
            kind: TriggerKind::RewardRedemption,
            name: name.into(),
            raw_input: None,
        }
    }

    pub fn command(name: impl Into<String>, raw_input: Option<String>) -> Self {
        Self {
            kind: TriggerKind::TypedCommand,
            name: name.into(),
            raw_input,
        }
    }

    pub fn is_redemption(&self) -> bool {
        self.kind == TriggerKind::RewardRedemption
    }
}
