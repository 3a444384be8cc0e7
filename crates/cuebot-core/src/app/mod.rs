//! App - アプリケーション層
//!
//! ports の実装を組み合わせて MediaPlayer を組み立てます。
//!
//! # 主要コンポーネント
//! - **PlayerBuilder**: プレイヤーの構築とワイヤリング

pub mod builder;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, PlayerBuilder};
