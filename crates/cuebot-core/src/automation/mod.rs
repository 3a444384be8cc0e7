//! Automation - シーン切り替えに連動するルール
//!
//! プログラムシーンが変わったときにホストから呼ばれ、
//! 報酬の一時停止/再開とマイクのミュートを切り替えます。

pub mod scene_rules;

pub use self::scene_rules::{MicSceneRule, RewardSceneRule};
