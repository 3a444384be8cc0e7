//! Configuration loading and validation.

use std::fs;
use std::path::Path;

use thiserror::Error;

use super::Config;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFailed(String),
    #[error("failed to parse config: {0}")]
    ParseFailed(String),
}

impl Config {
    /// Load configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            fs::read_to_string(path).map_err(|err| ConfigError::ReadFailed(err.to_string()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|err| ConfigError::ParseFailed(err.to_string()))
    }

    /// Load from `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Ok(Self::default()),
        }
    }

    /// Settings the player cannot run without, as human-readable problems.
    ///
    /// The player re-checks these per trigger; this is the up-front report
    /// for `cuebot check`.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.obs.scene.trim().is_empty() {
            problems.push("obs.scene is not set".to_string());
        }
        if self.obs.source.trim().is_empty() {
            problems.push("obs.source is not set".to_string());
        }
        if self.media.folder.is_none() {
            problems.push("media.folder is not set".to_string());
        }
        if self.media.separate_channel_point_folder && self.media.channel_point_folder.is_none() {
            problems.push(
                "media.separate_channel_point_folder is on but media.channel_point_folder is not set"
                    .to_string(),
            );
        }
        for (name, folder) in &self.media.random_folders {
            if self.media.folder_path(*folder).is_none() {
                problems.push(format!(
                    "media.random_folders.{name} uses the {folder} folder, which is not set"
                ));
            }
        }
        if self.media.history_limit == Some(0) {
            problems.push("media.history_limit must be above 0".to_string());
        }
        problems
    }
}
