//! Scene-driven rules applied when the program scene changes.
//!
//! - `RewardSceneRule`: managed channel-point rewards are redeemable only on
//!   the configured scenes.
//! - `MicSceneRule`: pause and starting-soon scenes mute the mic.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::{MicRuleConfig, RewardRuleConfig};
use crate::domain::CueError;
use crate::ports::{ObsControl, RewardControl};

fn require_scene(scene: &str) -> Result<(), CueError> {
    if scene.trim().is_empty() {
        return Err(CueError::InvalidRequest("scene name is empty".to_string()));
    }
    Ok(())
}

pub struct RewardSceneRule {
    rewards: Arc<dyn RewardControl>,
    config: RewardRuleConfig,
}

impl RewardSceneRule {
    pub fn new(rewards: Arc<dyn RewardControl>, config: RewardRuleConfig) -> Self {
        Self { rewards, config }
    }

    /// Pause or unpause managed rewards for `scene`. Returns how many changed.
    ///
    /// Only rewards this bot owns and that are enabled are touched.
    pub async fn apply(&self, scene: &str) -> Result<usize, CueError> {
        require_scene(scene)?;
        let redeemable = self.config.enabled_scenes.iter().any(|s| s == scene);
        let mut changed = 0;

        for reward in self.rewards.rewards().await? {
            if !self.config.rewards.contains(&reward.title) || !reward.is_ours || !reward.enabled {
                continue;
            }
            if redeemable && reward.paused {
                self.rewards.unpause(&reward.id).await?;
                info!(reward = %reward.title, scene, "reward unpaused");
                changed += 1;
            } else if !redeemable && !reward.paused {
                self.rewards.pause(&reward.id).await?;
                info!(reward = %reward.title, scene, "reward paused");
                changed += 1;
            }
        }
        Ok(changed)
    }
}

pub struct MicSceneRule {
    obs: Arc<dyn ObsControl>,
    config: MicRuleConfig,
}

impl MicSceneRule {
    pub fn new(obs: Arc<dyn ObsControl>, config: MicRuleConfig) -> Self {
        Self { obs, config }
    }

    /// `None` when the scene is not one this rule checks, otherwise whether
    /// the mic should be muted.
    pub fn mute_for(&self, scene: &str) -> Option<bool> {
        let rest = self
            .config
            .scene_prefixes
            .iter()
            .find_map(|prefix| scene.strip_prefix(prefix.as_str()))?;
        Some(
            self.config
                .muted_suffixes
                .iter()
                .any(|suffix| rest.starts_with(suffix.as_str())),
        )
    }

    /// Set the mic mute state for `scene`. Returns the state applied, or
    /// `None` when the scene was skipped.
    pub async fn apply(&self, scene: &str) -> Result<Option<bool>, CueError> {
        require_scene(scene)?;
        let Some(muted) = self.mute_for(scene) else {
            debug!(scene, "scene is not checked by the mic rule");
            return Ok(None);
        };
        self.obs
            .set_source_mute(&self.config.audio_scene, &self.config.mic_source, muted)
            .await?;
        info!(scene, muted, source = %self.config.mic_source, "mic state set");
        Ok(Some(muted))
    }
}
