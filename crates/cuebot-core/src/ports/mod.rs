//! Ports - 抽象化レイヤー
//!
//! ホスト（Streamer.bot 的な自動化ランタイム）が提供する機能を trait で
//! 切り出します。コアはこれらの trait だけに依存し、実装の詳細は
//! `impls` かホスト側のアダプタに置きます。
//!
//! # 外部協調者
//! - KeyValueStore: グローバル変数（BusyFlag / キュー / 履歴 / 再生時間キャッシュ）
//! - ObsControl: OBS WebSocket のシーン・ソース・メディア操作
//! - ChatSink: チャットへの通知
//! - MediaLibrary: メディアファイルの列挙
//! - RewardControl: チャンネルポイント報酬の一時停止/再開
//! - Clock / IdGenerator: 時刻と ID 生成

pub mod chat;
pub mod clock;
pub mod id_generator;
pub mod kv_store;
pub mod media_library;
pub mod obs;
pub mod rewards;

pub use self::chat::ChatSink;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::kv_store::{KeyValueStore, StoreError, read_json, write_json};
pub use self::media_library::{LibraryError, MEDIA_EXTENSIONS, MediaLibrary, is_media_file};
pub use self::obs::{ObsControl, ObsError, SceneItem};
pub use self::rewards::{Reward, RewardControl, RewardError};
