//! cuebot-core
//!
//! Core building blocks for the cuebot stream automation runtime.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, job, state, outcome, errors）
//! - **ports**: 抽象化レイヤー（KeyValueStore, ObsControl, ChatSink, MediaLibrary, RewardControl, など）
//! - **poller**: 有限回のポーリング（Bounded Poller）
//! - **queue**: 単一実行のメディア再生キュー（MediaPlayer）
//! - **picker**: 選択頻度で重み付けするランダムピッカー
//! - **automation**: シーン切り替え連動ルール
//! - **config**: TOML 設定
//! - **app**: ビルダー
//! - **impls**: 実装（InMemoryStore, SimulatedObs など開発用）
//! - **observability**: キュー状態のスナップショット

pub mod app;
pub mod automation;
pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod picker;
pub mod poller;
pub mod ports;
pub mod queue;
