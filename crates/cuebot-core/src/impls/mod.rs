//! Impls - 実装（開発用・テスト用）
//!
//! このモジュールには ports の実装を含めます。
//!
//! # 含まれる実装
//! - **InMemoryStore**: テスト用のグローバル変数ストア
//! - **JsonFileStore**: JSON ファイルに永続化するストア（CLI 用）
//! - **FsMediaLibrary**: ローカルフォルダのメディア列挙
//! - **SimulatedObs** / **SimulatedRewards**: OBS と報酬 API の代役
//! - **TracingChat**: チャット送信をログに流す
//!
//! # 本番用実装
//! OBS WebSocket やホストのグローバル変数に繋ぐアダプタは、
//! ホスト側で ports の trait を実装して差し込みます。

pub mod fs_library;
pub mod inmem_store;
pub mod json_file_store;
pub mod simulated_obs;
pub mod simulated_rewards;
pub mod tracing_chat;

// 主要な型を再エクスポート
pub use self::fs_library::FsMediaLibrary;
pub use self::inmem_store::InMemoryStore;
pub use self::json_file_store::JsonFileStore;
pub use self::simulated_obs::{ObsCalls, SimulatedObs};
pub use self::simulated_rewards::SimulatedRewards;
pub use self::tracing_chat::TracingChat;
