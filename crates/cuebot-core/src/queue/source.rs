//! Operations on the OBS media source that plays queued jobs.
//!
//! Every call that depends on OBS catching up with a previous request goes
//! through the bounded poller; forcing the source hidden uses its own loop
//! because there is no response payload to validate, only a visibility flag.

use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use crate::domain::CueError;
use crate::poller::{PollPolicy, contains_source, has_scene_name, is_positive_duration, poll_until_ready};
use crate::ports::ObsControl;

/// Poll budgets for each source operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceTiming {
    pub scene_query: PollPolicy,
    pub visibility: PollPolicy,
    pub file_confirm: PollPolicy,
    pub media_duration: PollPolicy,
}

impl Default for SourceTiming {
    fn default() -> Self {
        Self {
            scene_query: PollPolicy::SCENE_QUERY,
            visibility: PollPolicy::VISIBILITY,
            file_confirm: PollPolicy::FILE_CONFIRM,
            media_duration: PollPolicy::MEDIA_DURATION,
        }
    }
}

pub struct MediaSource<'a> {
    obs: &'a dyn ObsControl,
    scene: &'a str,
    source: &'a str,
    timing: SourceTiming,
}

impl<'a> MediaSource<'a> {
    pub fn new(obs: &'a dyn ObsControl, scene: &'a str, source: &'a str, timing: SourceTiming) -> Self {
        Self {
            obs,
            scene,
            source,
            timing,
        }
    }

    pub async fn ensure_connected(&self) -> Result<(), CueError> {
        if self.obs.is_connected().await {
            Ok(())
        } else {
            Err(CueError::Connectivity("OBS websocket is not connected".to_string()))
        }
    }

    /// Confirm the source is on the scene currently in program output.
    ///
    /// A source that is not on screen cannot report a media duration, so
    /// absence is NotFound. Returns the program scene name.
    pub async fn validate_on_program_scene(&self) -> Result<String, CueError> {
        let obs = self.obs;
        let scene = poll_until_ready(
            self.timing.scene_query,
            "current program scene",
            || obs.current_scene(),
            has_scene_name,
        )
        .await
        .map_err(|timeout| timeout.into_error())?;

        let found = poll_until_ready(
            self.timing.scene_query,
            "scene item list",
            || obs.scene_items(&scene),
            contains_source(self.source),
        )
        .await;

        match found {
            Ok(_) => {
                debug!(scene = %scene, source = self.source, "media source is on program scene");
                Ok(scene)
            }
            Err(timeout) if timeout.last.is_some() => Err(CueError::not_found(format!(
                "source '{}' is not on scene '{scene}'",
                self.source
            ))),
            Err(timeout) => Err(timeout.into_error()),
        }
    }

    /// Hide the source, re-checking until OBS reports it hidden.
    pub async fn force_hidden(&self) -> Result<(), CueError> {
        let policy = self.timing.visibility;
        let start = Instant::now();
        loop {
            if !self.obs.is_source_visible(self.scene, self.source).await? {
                return Ok(());
            }
            if start.elapsed() >= policy.timeout {
                return Err(CueError::Timeout {
                    operation: "hide media source",
                    elapsed: start.elapsed(),
                });
            }
            self.obs.hide_source(self.scene, self.source).await?;
            sleep(policy.interval).await;
        }
    }

    /// Point the source at `path` and wait until OBS reads the same path back.
    pub async fn load_file(&self, path: &str) -> Result<(), CueError> {
        self.ensure_connected().await?;
        self.obs
            .set_media_source_file(self.scene, self.source, path)
            .await?;

        let obs = self.obs;
        let source = self.source;
        poll_until_ready(
            self.timing.file_confirm,
            "media file read-back",
            || obs.input_file(source),
            |current: &String| current == path,
        )
        .await
        .map_err(|timeout| match timeout.last {
            Some(current) => CueError::not_found(format!(
                "source '{source}' kept file '{current}' instead of '{path}'"
            )),
            None => timeout.into_error(),
        })?;
        Ok(())
    }

    pub async fn show(&self) -> Result<(), CueError> {
        Ok(self.obs.show_source(self.scene, self.source).await?)
    }

    pub async fn hide(&self) -> Result<(), CueError> {
        Ok(self.obs.hide_source(self.scene, self.source).await?)
    }

    /// Ask OBS for the loaded media's duration until it reports a positive value.
    pub async fn query_duration(&self) -> Result<u64, CueError> {
        self.ensure_connected().await?;
        let obs = self.obs;
        let source = self.source;
        let duration = poll_until_ready(
            self.timing.media_duration,
            "media duration",
            || obs.media_duration_ms(source),
            is_positive_duration,
        )
        .await
        .map_err(|timeout| timeout.into_error())?;
        info!(source, duration_ms = duration, "measured media duration");
        Ok(duration as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;
    use crate::impls::SimulatedObs;

    const SCENE: &str = "Gameplay";
    const SOURCE: &str = "Media Player";

    fn obs() -> SimulatedObs {
        let obs = SimulatedObs::new(SCENE);
        obs.add_source(SCENE, SOURCE);
        obs
    }

    #[tokio::test(start_paused = true)]
    async fn validates_source_case_insensitively() {
        let obs = obs();
        let source = MediaSource::new(&obs, SCENE, "media PLAYER", SourceTiming::default());
        assert_eq!(source.validate_on_program_scene().await.unwrap(), SCENE);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_source_is_not_found_after_full_budget() {
        let obs = obs();
        let start = Instant::now();
        let source = MediaSource::new(&obs, SCENE, "Other Source", SourceTiming::default());

        let err = source.validate_on_program_scene().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(start.elapsed() >= PollPolicy::SCENE_QUERY.timeout);
        assert_eq!(obs.calls().scene_items, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn no_program_scene_times_out() {
        let obs = SimulatedObs::new("");
        let source = MediaSource::new(&obs, SCENE, SOURCE, SourceTiming::default());
        let err = source.validate_on_program_scene().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn force_hidden_hides_visible_source() {
        let obs = obs();
        obs.set_visible(SCENE, SOURCE, true);
        let source = MediaSource::new(&obs, SCENE, SOURCE, SourceTiming::default());

        source.force_hidden().await.unwrap();
        assert!(!obs.is_visible(SCENE, SOURCE));
    }

    #[tokio::test(start_paused = true)]
    async fn force_hidden_gives_up_when_source_stays_visible() {
        let obs = obs();
        obs.set_visible(SCENE, SOURCE, true);
        obs.set_stuck_visible(true);
        let source = MediaSource::new(&obs, SCENE, SOURCE, SourceTiming::default());

        let err = source.force_hidden().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn load_file_waits_for_read_back() {
        let obs = obs();
        obs.set_file_latency(3);
        let source = MediaSource::new(&obs, SCENE, SOURCE, SourceTiming::default());

        source.load_file("/clips/a.mp4").await.unwrap();
        assert_eq!(obs.calls().input_file, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnected_obs_is_connectivity_error() {
        let obs = obs();
        obs.set_connected(false);
        let source = MediaSource::new(&obs, SCENE, SOURCE, SourceTiming::default());

        let err = source.query_duration().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connectivity);
    }
}
