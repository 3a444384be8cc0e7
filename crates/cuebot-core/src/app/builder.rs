//! PlayerBuilder - MediaPlayer の構築とワイヤリング
//!
//! # 方針
//! - Builder パターンで ports を差し込む
//! - 起動時検証（Fail-fast）: 足りない port は build() でエラー
//! - 設定値そのものの検証はトリガーごとに Initializing で行う

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::Config;
use crate::ports::{
    ChatSink, IdGenerator, KeyValueStore, MediaLibrary, ObsControl, SystemClock, UlidGenerator,
};
use crate::queue::{MediaPlayer, PlayerPorts, PlayerSettings};

/// PlayerBuilder は MediaPlayer を構築
///
/// # 使用例
/// ```ignore
/// let player = PlayerBuilder::from_config(&config)
///     .store(store)
///     .obs(obs)
///     .library(FsMediaLibrary::new())
///     .chat(TracingChat)
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - store / obs / library / chat は必須
/// - ids と rng は省略時に既定値（ULID + OS 乱数）
pub struct PlayerBuilder {
    settings: PlayerSettings,
    store: Option<Arc<dyn KeyValueStore>>,
    obs: Option<Arc<dyn ObsControl>>,
    library: Option<Arc<dyn MediaLibrary>>,
    chat: Option<Arc<dyn ChatSink>>,
    ids: Option<Arc<dyn IdGenerator>>,
    seed: Option<u64>,
}

/// BuildError はプレイヤー構築時のエラー
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Missing ports: {0:?}. These collaborators must be provided before build().")]
    MissingPorts(Vec<&'static str>),
}

impl PlayerBuilder {
    pub fn new(settings: PlayerSettings) -> Self {
        Self {
            settings,
            store: None,
            obs: None,
            library: None,
            chat: None,
            ids: None,
            seed: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(PlayerSettings::from_config(config))
    }

    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn obs(mut self, obs: Arc<dyn ObsControl>) -> Self {
        self.obs = Some(obs);
        self
    }

    pub fn library(mut self, library: impl MediaLibrary + 'static) -> Self {
        self.library = Some(Arc::new(library));
        self
    }

    pub fn chat(mut self, chat: impl ChatSink + 'static) -> Self {
        self.chat = Some(Arc::new(chat));
        self
    }

    pub fn ids(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Some(Arc::new(ids));
        self
    }

    /// Fix the random selection sequence.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// 不足している port をまとめて報告する
    pub fn build(self) -> Result<MediaPlayer, BuildError> {
        let mut missing = Vec::new();
        if self.store.is_none() {
            missing.push("store");
        }
        if self.obs.is_none() {
            missing.push("obs");
        }
        if self.library.is_none() {
            missing.push("library");
        }
        if self.chat.is_none() {
            missing.push("chat");
        }

        let (Some(store), Some(obs), Some(library), Some(chat)) =
            (self.store, self.obs, self.library, self.chat)
        else {
            return Err(BuildError::MissingPorts(missing));
        };

        let ports = PlayerPorts {
            store,
            obs,
            library,
            chat,
            ids: self
                .ids
                .unwrap_or_else(|| Arc::new(UlidGenerator::new(SystemClock))),
        };
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(MediaPlayer::new(ports, self.settings, rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{FsMediaLibrary, InMemoryStore, SimulatedObs, TracingChat};

    #[test]
    fn test_build_success() {
        let player = PlayerBuilder::new(PlayerSettings::default())
            .store(Arc::new(InMemoryStore::new()))
            .obs(Arc::new(SimulatedObs::new("Gameplay")))
            .library(FsMediaLibrary::new())
            .chat(TracingChat)
            .seed(1)
            .build();
        assert!(player.is_ok());
    }

    #[test]
    fn test_build_missing_ports() {
        let result = PlayerBuilder::new(PlayerSettings::default())
            .obs(Arc::new(SimulatedObs::new("Gameplay")))
            .chat(TracingChat)
            .build();
        assert!(matches!(
            result,
            Err(BuildError::MissingPorts(missing)) if missing == vec!["store", "library"]
        ));
    }

    #[test]
    fn test_from_config_carries_settings() {
        let config = Config::from_toml("[obs]\nscene = \"Gameplay\"\nsource = \"Player\"\n").unwrap();
        let player = PlayerBuilder::from_config(&config)
            .store(Arc::new(InMemoryStore::new()))
            .obs(Arc::new(SimulatedObs::new("Gameplay")))
            .library(FsMediaLibrary::new())
            .chat(TracingChat)
            .build()
            .unwrap();
        assert_eq!(player.settings().scene, "Gameplay");
        assert_eq!(player.settings().keys.queue, "DMFL_CURRENT_QUEUE");
    }
}
