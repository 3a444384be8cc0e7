//! Queue - single-flight media playback
//!
//! トリガーごとに 1..N 件の `MediaJob` を永続キューへ積み、
//! OBS のメディアソースで 1 件ずつ再生します。
//!
//! # 構成
//! - **flight**: BusyFlag（compare-and-set による単一実行）
//! - **ledger**: 再生キューと再生履歴
//! - **cache**: 再生時間とファイル位置のキャッシュ
//! - **selection**: mapped / random の選択ポリシー
//! - **source**: OBS メディアソース操作（poller 経由）
//! - **player**: 状態機械の駆動

pub mod cache;
pub mod flight;
pub mod keys;
pub mod ledger;
pub mod player;
pub mod selection;
pub mod source;

pub use self::cache::{DurationCache, LocationCache};
pub use self::flight::{FlightGuard, SingleFlight};
pub use self::keys::StoreKeys;
pub use self::ledger::PlaybackLedger;
pub use self::player::{MediaPlayer, PlayerPorts, PlayerSettings};
pub use self::selection::{SelectionPolicy, lookup_mapping};
pub use self::source::{MediaSource, SourceTiming};
