//! RewardControl port - チャンネルポイント報酬の操作

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RewardError {
    #[error("reward request failed: {0}")]
    Request(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub id: String,
    pub title: String,
    /// Created by this bot, so it may pause/unpause it.
    pub is_ours: bool,
    pub enabled: bool,
    pub paused: bool,
}

#[async_trait]
pub trait RewardControl: Send + Sync {
    async fn rewards(&self) -> Result<Vec<Reward>, RewardError>;

    async fn pause(&self, reward_id: &str) -> Result<(), RewardError>;

    async fn unpause(&self, reward_id: &str) -> Result<(), RewardError>;
}
