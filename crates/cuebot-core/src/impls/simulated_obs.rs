//! SimulatedObs - OBS WebSocket の代役
//!
//! シーン・ソースの可視状態・メディアファイル・再生時間をメモリ上に持ち、
//! 呼び出し回数を数えます。テストと CLI のドライランで使います。
//!
//! # 再現できる挙動
//! - ファイル設定直後の read-back 遅延（`set_file_latency`）
//! - 非表示にできないソース（`set_stuck_visible`）
//! - 切断（`set_connected(false)`）

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::ports::{ObsControl, ObsError, SceneItem};

/// Number of calls per request type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObsCalls {
    pub current_scene: u32,
    pub scene_items: u32,
    pub show: u32,
    pub hide: u32,
    pub set_file: u32,
    pub input_file: u32,
    pub media_duration: u32,
    pub set_mute: u32,
}

#[derive(Debug, Default)]
struct State {
    connected: bool,
    program_scene: String,
    scenes: HashMap<String, Vec<String>>,
    visible: HashSet<(String, String)>,
    stuck_visible: bool,
    files: HashMap<String, String>,
    file_latency: u32,
    /// Source -> (reads still returning the old file, file to switch to).
    pending: HashMap<String, (u32, String)>,
    durations: HashMap<String, i64>,
    default_duration: Option<i64>,
    muted: HashMap<(String, String), bool>,
    calls: ObsCalls,
}

#[derive(Debug)]
pub struct SimulatedObs {
    state: Mutex<State>,
}

impl SimulatedObs {
    /// A connected OBS showing `program_scene`. An empty name means no
    /// program scene is reported.
    pub fn new(program_scene: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(State {
                connected: true,
                program_scene: program_scene.into(),
                ..State::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_source(&self, scene: &str, source: &str) {
        self.state()
            .scenes
            .entry(scene.to_string())
            .or_default()
            .push(source.to_string());
    }

    pub fn set_connected(&self, connected: bool) {
        self.state().connected = connected;
    }

    pub fn set_visible(&self, scene: &str, source: &str, visible: bool) {
        let key = (scene.to_string(), source.to_string());
        let mut state = self.state();
        if visible {
            state.visible.insert(key);
        } else {
            state.visible.remove(&key);
        }
    }

    pub fn is_visible(&self, scene: &str, source: &str) -> bool {
        self.state()
            .visible
            .contains(&(scene.to_string(), source.to_string()))
    }

    /// Ignore hide requests.
    pub fn set_stuck_visible(&self, stuck: bool) {
        self.state().stuck_visible = stuck;
    }

    /// Number of read-backs that still return the previous file after a set.
    pub fn set_file_latency(&self, reads: u32) {
        self.state().file_latency = reads;
    }

    /// Duration reported once `path` is loaded. Unknown files report nothing.
    pub fn set_duration(&self, path: &str, duration_ms: i64) {
        self.state().durations.insert(path.to_string(), duration_ms);
    }

    /// Duration reported for loaded files without their own entry.
    pub fn set_default_duration(&self, duration_ms: Option<i64>) {
        self.state().default_duration = duration_ms;
    }

    pub fn is_muted(&self, scene: &str, source: &str) -> Option<bool> {
        self.state()
            .muted
            .get(&(scene.to_string(), source.to_string()))
            .copied()
    }

    pub fn loaded_file(&self, source: &str) -> Option<String> {
        self.state().files.get(source).cloned()
    }

    pub fn calls(&self) -> ObsCalls {
        self.state().calls
    }

    fn connected(state: &State) -> Result<(), ObsError> {
        if state.connected {
            Ok(())
        } else {
            Err(ObsError::Disconnected)
        }
    }
}

#[async_trait::async_trait]
impl ObsControl for SimulatedObs {
    async fn is_connected(&self) -> bool {
        self.state().connected
    }

    async fn current_scene(&self) -> Result<Option<String>, ObsError> {
        let mut state = self.state();
        state.calls.current_scene += 1;
        Self::connected(&state)?;
        if state.program_scene.is_empty() {
            return Ok(None);
        }
        Ok(Some(state.program_scene.clone()))
    }

    async fn scene_items(&self, scene: &str) -> Result<Option<Vec<SceneItem>>, ObsError> {
        let mut state = self.state();
        state.calls.scene_items += 1;
        Self::connected(&state)?;
        let items = state
            .scenes
            .get(scene)
            .map(|sources| sources.iter().map(SceneItem::new).collect())
            .unwrap_or_default();
        Ok(Some(items))
    }

    async fn is_source_visible(&self, scene: &str, source: &str) -> Result<bool, ObsError> {
        let state = self.state();
        Self::connected(&state)?;
        Ok(state
            .visible
            .contains(&(scene.to_string(), source.to_string())))
    }

    async fn show_source(&self, scene: &str, source: &str) -> Result<(), ObsError> {
        let mut state = self.state();
        state.calls.show += 1;
        Self::connected(&state)?;
        state.visible.insert((scene.to_string(), source.to_string()));
        Ok(())
    }

    async fn hide_source(&self, scene: &str, source: &str) -> Result<(), ObsError> {
        let mut state = self.state();
        state.calls.hide += 1;
        Self::connected(&state)?;
        if !state.stuck_visible {
            state
                .visible
                .remove(&(scene.to_string(), source.to_string()));
        }
        Ok(())
    }

    async fn set_media_source_file(
        &self,
        _scene: &str,
        source: &str,
        path: &str,
    ) -> Result<(), ObsError> {
        let mut state = self.state();
        state.calls.set_file += 1;
        Self::connected(&state)?;
        let latency = state.file_latency;
        if latency == 0 {
            state.files.insert(source.to_string(), path.to_string());
        } else {
            state
                .pending
                .insert(source.to_string(), (latency, path.to_string()));
        }
        debug!(source, path, "simulated media file set");
        Ok(())
    }

    async fn input_file(&self, source: &str) -> Result<Option<String>, ObsError> {
        let mut state = self.state();
        state.calls.input_file += 1;
        Self::connected(&state)?;
        if let Some((reads_left, next)) = state.pending.remove(source) {
            // 遅延中は古い値を返し、最後の遅延読み出しで切り替える
            let old = state.files.get(source).cloned();
            if reads_left > 1 {
                state.pending.insert(source.to_string(), (reads_left - 1, next));
            } else {
                state.files.insert(source.to_string(), next);
            }
            return Ok(old);
        }
        Ok(state.files.get(source).cloned())
    }

    async fn media_duration_ms(&self, source: &str) -> Result<Option<i64>, ObsError> {
        let mut state = self.state();
        state.calls.media_duration += 1;
        Self::connected(&state)?;
        let duration = state
            .files
            .get(source)
            .and_then(|file| state.durations.get(file).copied().or(state.default_duration));
        Ok(duration)
    }

    async fn set_source_mute(
        &self,
        scene: &str,
        source: &str,
        muted: bool,
    ) -> Result<(), ObsError> {
        let mut state = self.state();
        state.calls.set_mute += 1;
        Self::connected(&state)?;
        state
            .muted
            .insert((scene.to_string(), source.to_string()), muted);
        Ok(())
    }
}
