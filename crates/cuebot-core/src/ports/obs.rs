//! ObsControl port - OBS WebSocket の操作面
//!
//! OBS の API は非同期で、リクエスト直後は空の応答が返ることがあります。
//! そのため「応答なし」は `Ok(None)` で表し、リトライは `poller` に任せます。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObsError {
    #[error("OBS websocket is not connected")]
    Disconnected,

    #[error("OBS request {request} failed: {message}")]
    Request {
        request: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneItem {
    pub source_name: String,
}

impl SceneItem {
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
        }
    }
}

/// ObsControl は OBS の scene / source / media を操作
#[async_trait]
pub trait ObsControl: Send + Sync {
    async fn is_connected(&self) -> bool;

    /// Name of the scene currently on program output.
    async fn current_scene(&self) -> Result<Option<String>, ObsError>;

    async fn scene_items(&self, scene: &str) -> Result<Option<Vec<SceneItem>>, ObsError>;

    async fn is_source_visible(&self, scene: &str, source: &str) -> Result<bool, ObsError>;

    async fn show_source(&self, scene: &str, source: &str) -> Result<(), ObsError>;

    async fn hide_source(&self, scene: &str, source: &str) -> Result<(), ObsError>;

    async fn set_media_source_file(
        &self,
        scene: &str,
        source: &str,
        path: &str,
    ) -> Result<(), ObsError>;

    /// Read back the `local_file` input setting of a media source.
    async fn input_file(&self, source: &str) -> Result<Option<String>, ObsError>;

    /// Duration of the media loaded in `source`, in milliseconds.
    async fn media_duration_ms(&self, source: &str) -> Result<Option<i64>, ObsError>;

    async fn set_source_mute(&self, scene: &str, source: &str, muted: bool)
    -> Result<(), ObsError>;
}
