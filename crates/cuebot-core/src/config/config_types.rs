//! Configuration types and defaults for cuebot.
//!
//! Every section is `#[serde(default)]`, so a config file only needs the
//! values that differ from the defaults.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::poller::PollPolicy;
use crate::queue::{SelectionPolicy, SourceTiming, StoreKeys, lookup_mapping};

/// Top-level configuration loaded from cuebot.toml.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub obs: ObsConfig,
    pub media: MediaConfig,
    pub timing: TimingConfig,
    pub keys: StoreKeys,
    pub chat: ChatConfig,
    pub logging: LoggingConfig,
    pub scene_rules: SceneRulesConfig,
}

/// Scene and media source the player drives.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ObsConfig {
    pub scene: String,
    pub source: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Folder that mapped paths are relative to, and that random picks scan.
    pub folder: Option<PathBuf>,
    /// Separate folder for reward redemptions.
    pub channel_point_folder: Option<PathBuf>,
    /// Route reward redemptions to `channel_point_folder`.
    pub separate_channel_point_folder: bool,
    pub selection: SelectionPolicy,
    /// Random selection only: read the number of files from a typed
    /// command's argument.
    pub count_from_command_input: bool,
    /// Trust durations measured on earlier plays.
    pub reuse_known_durations: bool,
    /// Mapped selection only: remember resolved paths per trigger name.
    pub reuse_file_locations: bool,
    /// Keep at most this many history entries. Unbounded when absent.
    pub history_limit: Option<usize>,
    /// Command name -> path relative to `folder`.
    pub command_files: HashMap<String, String>,
    /// Reward title -> path relative to the active folder.
    pub reward_files: HashMap<String, String>,
    /// Random selection only: trigger name -> folder it scans. When empty,
    /// every trigger scans the folder `folder_for` picks.
    pub random_folders: HashMap<String, MediaFolder>,
}

/// One of the two configured media folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaFolder {
    Main,
    ChannelPoint,
}

impl fmt::Display for MediaFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaFolder::Main => f.write_str("main"),
            MediaFolder::ChannelPoint => f.write_str("channel point"),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            folder: None,
            channel_point_folder: None,
            separate_channel_point_folder: false,
            selection: SelectionPolicy::Mapped,
            count_from_command_input: false,
            reuse_known_durations: true,
            reuse_file_locations: false,
            history_limit: None,
            command_files: HashMap::new(),
            reward_files: HashMap::new(),
            random_folders: HashMap::new(),
        }
    }
}

impl MediaConfig {
    /// Folder a trigger plays from, and whether it is the channel-point one.
    pub fn folder_for(&self, is_redemption: bool) -> (Option<&Path>, bool) {
        if is_redemption && self.separate_channel_point_folder {
            (self.channel_point_folder.as_deref(), true)
        } else {
            (self.folder.as_deref(), false)
        }
    }

    pub fn folder_path(&self, folder: MediaFolder) -> Option<&Path> {
        match folder {
            MediaFolder::Main => self.folder.as_deref(),
            MediaFolder::ChannelPoint => self.channel_point_folder.as_deref(),
        }
    }

    /// Folder the random trigger `name` scans, looked up case-insensitively
    /// in `random_folders`.
    pub fn random_folder(&self, name: &str) -> Option<MediaFolder> {
        lookup_mapping(&self.random_folders, name).copied()
    }
}

/// One poll budget in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PollSetting {
    pub interval_ms: u64,
    pub timeout_ms: u64,
}

impl PollSetting {
    pub fn policy(&self) -> PollPolicy {
        PollPolicy::from_millis(self.interval_ms, self.timeout_ms)
    }
}

impl From<PollPolicy> for PollSetting {
    fn from(policy: PollPolicy) -> Self {
        Self {
            interval_ms: policy.interval.as_millis() as u64,
            timeout_ms: policy.timeout.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    pub scene_query: PollSetting,
    pub visibility: PollSetting,
    pub file_confirm: PollSetting,
    pub media_duration: PollSetting,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            scene_query: PollPolicy::SCENE_QUERY.into(),
            visibility: PollPolicy::VISIBILITY.into(),
            file_confirm: PollPolicy::FILE_CONFIRM.into(),
            media_duration: PollPolicy::MEDIA_DURATION.into(),
        }
    }
}

impl TimingConfig {
    pub fn source_timing(&self) -> SourceTiming {
        SourceTiming {
            scene_query: self.scene_query.policy(),
            visibility: self.visibility.policy(),
            file_confirm: self.file_confirm.policy(),
            media_duration: self.media_duration.policy(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Repeat error and shortfall messages into chat.
    pub mirror_errors: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SceneRulesConfig {
    pub rewards: RewardRuleConfig,
    pub mic: MicRuleConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RewardRuleConfig {
    /// Scenes on which the managed rewards are redeemable.
    pub enabled_scenes: Vec<String>,
    /// Reward titles this rule pauses and unpauses.
    pub rewards: Vec<String>,
}

impl Default for RewardRuleConfig {
    fn default() -> Self {
        Self {
            enabled_scenes: vec![
                "00_tactical_pause".to_string(),
                "01_Game_Fullscreen_Ultrawide".to_string(),
                "01_Game_FullScrean_Cropped".to_string(),
            ],
            rewards: vec![
                "Gratitude".to_string(),
                "Crimewatch".to_string(),
                "PixelMan".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MicRuleConfig {
    /// Only scenes starting with one of these are checked.
    pub scene_prefixes: Vec<String>,
    /// `<prefix><suffix>...` scenes mute the mic.
    pub muted_suffixes: Vec<String>,
    /// Scene holding the mic source.
    pub audio_scene: String,
    pub mic_source: String,
}

impl Default for MicRuleConfig {
    fn default() -> Self {
        Self {
            scene_prefixes: vec!["00".to_string(), "01".to_string()],
            muted_suffixes: vec!["_tactical_pause".to_string(), "_starting_soon".to_string()],
            audio_scene: "03_Audio Settings - Separated".to_string(),
            mic_source: "Reaper Audio".to_string(),
        }
    }
}
