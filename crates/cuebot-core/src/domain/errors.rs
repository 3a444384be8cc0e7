//! Errors - エラー型と分類
//!
//! コンポーネント境界を越えるエラーはすべて `CueError` に集約します。
//! 呼び出し側は `kind()` で運用分類を確認できます。

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ports::{LibraryError, ObsError, RewardError, StoreError};

/// ErrorKind は実行エラーの運用分類
///
/// - Configuration: 設定不足・不正（BusyFlag に触れる前に中断）
/// - Connectivity: OBS に到達できない
/// - Timeout: ポーリングが予算を使い切った
/// - NotFound: ファイル・ソース・メディアが見つからない
/// - InvalidRequest: トリガー引数が不正
/// - Storage: グローバル変数ストアの障害
/// - InternalInvariant: 到達不能のはずの分岐（致命的、リトライしない）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Connectivity,
    Timeout,
    NotFound,
    InvalidRequest,
    Storage,
    InternalInvariant,
}

#[derive(Debug, Error)]
pub enum CueError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("OBS connectivity error: {0}")]
    Connectivity(String),

    #[error("{operation} timed out after {}ms", .elapsed.as_millis())]
    Timeout {
        operation: &'static str,
        elapsed: Duration,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

impl CueError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CueError::Configuration(_) => ErrorKind::Configuration,
            CueError::Connectivity(_) => ErrorKind::Connectivity,
            CueError::Timeout { .. } => ErrorKind::Timeout,
            CueError::NotFound(_) => ErrorKind::NotFound,
            CueError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            CueError::Storage(_) => ErrorKind::Storage,
            CueError::InternalInvariant(_) => ErrorKind::InternalInvariant,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        CueError::Configuration(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        CueError::NotFound(message.into())
    }
}

impl From<ObsError> for CueError {
    fn from(err: ObsError) -> Self {
        CueError::Connectivity(err.to_string())
    }
}

impl From<LibraryError> for CueError {
    fn from(err: LibraryError) -> Self {
        CueError::NotFound(err.to_string())
    }
}

impl From<RewardError> for CueError {
    fn from(err: RewardError) -> Self {
        CueError::Connectivity(err.to_string())
    }
}
