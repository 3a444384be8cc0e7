//! SimulatedRewards - チャンネルポイント報酬の代役

use std::sync::Mutex;

use crate::ports::{Reward, RewardControl, RewardError};

#[derive(Debug, Default)]
pub struct SimulatedRewards {
    rewards: Mutex<Vec<Reward>>,
}

impl SimulatedRewards {
    pub fn new(rewards: Vec<Reward>) -> Self {
        Self {
            rewards: Mutex::new(rewards),
        }
    }

    pub fn snapshot(&self) -> Vec<Reward> {
        self.rewards
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set_paused(&self, reward_id: &str, paused: bool) -> Result<(), RewardError> {
        let mut rewards = self
            .rewards
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let reward = rewards
            .iter_mut()
            .find(|r| r.id == reward_id)
            .ok_or_else(|| RewardError::Request(format!("unknown reward id {reward_id}")))?;
        reward.paused = paused;
        Ok(())
    }
}

#[async_trait::async_trait]
impl RewardControl for SimulatedRewards {
    async fn rewards(&self) -> Result<Vec<Reward>, RewardError> {
        Ok(self.snapshot())
    }

    async fn pause(&self, reward_id: &str) -> Result<(), RewardError> {
        self.set_paused(reward_id, true)
    }

    async fn unpause(&self, reward_id: &str) -> Result<(), RewardError> {
        self.set_paused(reward_id, false)
    }
}
