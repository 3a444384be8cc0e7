//! MediaPlayer - single-flight playback of triggered media.
//!
//! One `handle` call walks the playback phases in order:
//!
//! ```text
//! Idle -> Initializing -> SourceValidated -> SourceOff -> Enqueuing -> Draining -> Idle
//!                                                                              \-> Failed
//! ```
//!
//! Initializing and SourceValidated only read. The busy flag is taken with a
//! compare-and-set right before SourceOff and released exactly once when the
//! invocation ends, whatever the outcome.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use tokio::time::sleep;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::config::{Config, MediaConfig};
use crate::domain::{
    BatchOutcome, BatchReport, CueError, InvocationId, JobFailure, MediaJob, PlaybackPhase,
    Trigger, TriggerKind,
};
use crate::observability::QueueStatus;
use crate::ports::{ChatSink, IdGenerator, KeyValueStore, MediaLibrary, ObsControl};

use super::cache::{DurationCache, LocationCache};
use super::flight::SingleFlight;
use super::keys::StoreKeys;
use super::ledger::PlaybackLedger;
use super::selection::{SelectionPolicy, mapped_path, pick_random, requested_count};
use super::source::{MediaSource, SourceTiming};

/// External collaborators of the player.
#[derive(Clone)]
pub struct PlayerPorts {
    pub store: Arc<dyn KeyValueStore>,
    pub obs: Arc<dyn ObsControl>,
    pub library: Arc<dyn MediaLibrary>,
    pub chat: Arc<dyn ChatSink>,
    pub ids: Arc<dyn IdGenerator>,
}

/// Everything the player reads from configuration.
#[derive(Debug, Clone, Default)]
pub struct PlayerSettings {
    pub scene: String,
    pub source: String,
    pub media: MediaConfig,
    pub timing: SourceTiming,
    pub keys: StoreKeys,
    pub mirror_errors: bool,
}

impl PlayerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            scene: config.obs.scene.clone(),
            source: config.obs.source.clone(),
            media: config.media.clone(),
            timing: config.timing.source_timing(),
            keys: config.keys.clone(),
            mirror_errors: config.chat.mirror_errors,
        }
    }
}

/// Folder a batch plays from, settled during Initializing.
#[derive(Debug, Clone)]
struct Target {
    folder: PathBuf,
    channel_point_folder: bool,
}

/// Which identifier a batch keys its measured durations by.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DurationKeying {
    pub channel_point_folder: bool,
    pub by_display_name: bool,
}

impl DurationKeying {
    /// Mapped redemptions key by their own name, so two rewards sharing a
    /// file keep separate measurements. Everything else keys by file name.
    /// The channel-point folder only changes the key prefix.
    fn for_batch(trigger: &Trigger, target: &Target, selection: SelectionPolicy) -> Self {
        Self {
            channel_point_folder: target.channel_point_folder,
            by_display_name: trigger.is_redemption() && selection == SelectionPolicy::Mapped,
        }
    }

    fn identifier<'j>(&self, job: &'j MediaJob) -> &'j str {
        if self.by_display_name {
            &job.display_name
        } else {
            job.file_name()
        }
    }
}

/// Guards the phase order of one invocation.
struct PhaseTracker {
    phase: PlaybackPhase,
}

impl PhaseTracker {
    fn new() -> Self {
        Self {
            phase: PlaybackPhase::Idle,
        }
    }

    fn advance(&mut self, to: PlaybackPhase) -> Result<(), CueError> {
        if self.phase.next() != to {
            return Err(CueError::InternalInvariant(format!(
                "illegal playback transition {:?} -> {:?}",
                self.phase, to
            )));
        }
        debug!(from = ?self.phase, to = ?to, "playback phase");
        self.phase = to;
        Ok(())
    }

    fn fail(&mut self) {
        if !self.phase.is_terminal() {
            debug!(
                from = ?self.phase,
                releases_flag = self.phase.holds_flight(),
                "playback failed"
            );
        }
        self.phase = PlaybackPhase::Failed;
    }
}

pub struct MediaPlayer {
    ports: PlayerPorts,
    settings: PlayerSettings,
    flight: SingleFlight,
    ledger: PlaybackLedger,
    rng: Mutex<StdRng>,
}

impl MediaPlayer {
    pub fn new(ports: PlayerPorts, settings: PlayerSettings, rng: StdRng) -> Self {
        let flight = SingleFlight::new(Arc::clone(&ports.store), settings.keys.status.clone());
        let ledger = PlaybackLedger::new(
            Arc::clone(&ports.store),
            settings.keys.queue.clone(),
            settings.keys.history.clone(),
        )
        .with_history_limit(settings.media.history_limit);
        Self {
            ports,
            settings,
            flight,
            ledger,
            rng: Mutex::new(rng),
        }
    }

    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    /// Run one trigger to completion.
    ///
    /// `Ok(Busy)` means another invocation is playing and nothing was touched.
    /// `Ok(Played)` means at least one job played. Any error is logged (and
    /// mirrored to chat when enabled) before it is returned.
    pub async fn handle(&self, trigger: &Trigger) -> Result<BatchOutcome, CueError> {
        let invocation = self.ports.ids.generate_invocation_id();
        let span = info_span!(
            "invocation",
            %invocation,
            kind = %trigger.kind,
            name = %trigger.name
        );
        async {
            let result = self.run(invocation, trigger).await;
            match &result {
                Ok(BatchOutcome::Busy) => {}
                Ok(BatchOutcome::Played(report)) => info!(
                    played = report.played.len(),
                    requested = report.requested,
                    outcome = ?report.kind(),
                    "batch finished"
                ),
                Err(err) => self.report_error(err).await,
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Busy flag, pending jobs and history as currently stored.
    pub async fn status(&self) -> Result<QueueStatus, CueError> {
        let busy = self.flight.is_busy().await?;
        let queued = self.ledger.queue().await?;
        let history = self.ledger.history().await?;
        Ok(QueueStatus::new(busy, queued, &history))
    }

    async fn run(&self, invocation: InvocationId, trigger: &Trigger) -> Result<BatchOutcome, CueError> {
        if self.flight.is_busy().await? {
            info!("playback already in progress, skipping trigger");
            return Ok(BatchOutcome::Busy);
        }

        let mut phases = PhaseTracker::new();
        let source = self.media_source();
        let target = match self.prepare(trigger, &source, &mut phases).await {
            Ok(target) => target,
            Err(err) => {
                phases.fail();
                return Err(err);
            }
        };

        let Some(guard) = self.flight.try_acquire().await? else {
            info!("another invocation took the busy flag first, skipping trigger");
            return Ok(BatchOutcome::Busy);
        };

        let result = self
            .play_batch(invocation, trigger, &target, &source, &mut phases)
            .await;
        if result.is_err() {
            phases.fail();
        }

        match guard.release().await {
            Ok(()) => result,
            Err(release_err) => {
                error!(error = %release_err, "failed to clear busy flag");
                match result {
                    Ok(_) => Err(release_err.into()),
                    Err(err) => Err(err),
                }
            }
        }
    }

    fn media_source(&self) -> MediaSource<'_> {
        MediaSource::new(
            self.ports.obs.as_ref(),
            &self.settings.scene,
            &self.settings.source,
            self.settings.timing,
        )
    }

    /// Initializing and SourceValidated. Reads only.
    async fn prepare(
        &self,
        trigger: &Trigger,
        source: &MediaSource<'_>,
        phases: &mut PhaseTracker,
    ) -> Result<Target, CueError> {
        phases.advance(PlaybackPhase::Initializing)?;
        let target = self.resolve_target(trigger)?;
        source.ensure_connected().await?;

        source.validate_on_program_scene().await?;
        phases.advance(PlaybackPhase::SourceValidated)?;
        Ok(target)
    }

    fn resolve_target(&self, trigger: &Trigger) -> Result<Target, CueError> {
        if self.settings.scene.trim().is_empty() {
            return Err(CueError::config("OBS scene name is not set"));
        }
        if self.settings.source.trim().is_empty() {
            return Err(CueError::config("OBS media source name is not set"));
        }
        if trigger.name.trim().is_empty() {
            return Err(CueError::config(format!("{} trigger has no name", trigger.kind)));
        }
        let media = &self.settings.media;
        if media.history_limit == Some(0) {
            return Err(CueError::config("history limit must be above 0"));
        }

        let (folder, channel_point_folder) = media.folder_for(trigger.is_redemption());
        let folder = if media.selection == SelectionPolicy::Random && !media.random_folders.is_empty() {
            let choice = media.random_folder(&trigger.name).ok_or_else(|| {
                CueError::config(format!("no random media folder mapped for '{}'", trigger.name))
            })?;
            media
                .folder_path(choice)
                .ok_or_else(|| CueError::config(format!("{choice} media folder is not set")))?
        } else {
            folder.ok_or_else(|| {
                if channel_point_folder {
                    CueError::config("channel point media folder is not set")
                } else {
                    CueError::config("media folder is not set")
                }
            })?
        };
        Ok(Target {
            folder: folder.to_path_buf(),
            channel_point_folder,
        })
    }

    /// SourceOff, Enqueuing and Draining, run with the busy flag held.
    async fn play_batch(
        &self,
        invocation: InvocationId,
        trigger: &Trigger,
        target: &Target,
        source: &MediaSource<'_>,
        phases: &mut PhaseTracker,
    ) -> Result<BatchOutcome, CueError> {
        phases.advance(PlaybackPhase::SourceOff)?;
        source.force_hidden().await?;

        phases.advance(PlaybackPhase::Enqueuing)?;
        self.ledger.ensure_initialized().await?;
        let (requested, jobs) = self.select_jobs(trigger, target).await?;
        if jobs.is_empty() {
            return Err(CueError::not_found(format!(
                "no media could be resolved for '{}'",
                trigger.name
            )));
        }
        let queued = self.ledger.enqueue(&jobs).await?;
        let mut report = BatchReport::new(invocation, requested);
        report.enqueued = jobs.len();
        if report.enqueued < requested {
            self.report_shortfall(format!("queued {} of {requested} requested files", report.enqueued))
                .await;
        }
        debug!(enqueued = report.enqueued, queued, "batch enqueued");

        phases.advance(PlaybackPhase::Draining)?;
        let keying = DurationKeying::for_batch(trigger, target, self.settings.media.selection);
        let last_error = self.drain(source, keying, &mut report).await?;

        if report.played.is_empty() {
            return Err(last_error.unwrap_or_else(|| CueError::not_found("playback queue is empty")));
        }
        phases.advance(PlaybackPhase::Idle)?;

        if report.shortfall() > 0 {
            self.report_shortfall(format!(
                "played {} of {} requested files",
                report.played.len(),
                report.requested
            ))
            .await;
        }
        Ok(BatchOutcome::Played(report))
    }

    /// Requested count and the jobs to append for this trigger.
    async fn select_jobs(
        &self,
        trigger: &Trigger,
        target: &Target,
    ) -> Result<(usize, Vec<MediaJob>), CueError> {
        match self.settings.media.selection {
            SelectionPolicy::Mapped => {
                let job = self.resolve_mapped(trigger, target).await?;
                Ok((1, vec![job]))
            }
            SelectionPolicy::Random => {
                let files = self.ports.library.media_files(&target.folder).await?;
                if files.is_empty() {
                    return Err(CueError::not_found(format!(
                        "no media files under {}",
                        target.folder.display()
                    )));
                }
                let count = requested_count(
                    trigger,
                    self.settings.media.count_from_command_input,
                    files.len(),
                )?;
                let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                Ok((count, pick_random(&files, count, &mut *rng)))
            }
        }
    }

    async fn resolve_mapped(&self, trigger: &Trigger, target: &Target) -> Result<MediaJob, CueError> {
        let media = &self.settings.media;
        let locations = LocationCache::new(
            Arc::clone(&self.ports.store),
            self.settings.keys.location_prefix(target.channel_point_folder),
        );

        if media.reuse_file_locations
            && let Some(cached) = locations.get(&trigger.name).await?
        {
            if self.ports.library.exists(Path::new(&cached)).await {
                debug!(path = %cached, "using known file location");
                return Ok(MediaJob::new(trigger.name.clone(), cached));
            }
            debug!(path = %cached, "known file location is gone, resolving again");
        }

        let table = match trigger.kind {
            TriggerKind::RewardRedemption => &media.reward_files,
            TriggerKind::TypedCommand => &media.command_files,
        };
        let path = mapped_path(table, &target.folder, &trigger.name)?;
        if !self.ports.library.exists(&path).await {
            return Err(CueError::not_found(format!(
                "media file {} does not exist",
                path.display()
            )));
        }

        let path = path.to_string_lossy().into_owned();
        if media.reuse_file_locations {
            locations.record(&trigger.name, &path).await?;
        }
        Ok(MediaJob::new(trigger.name.clone(), path))
    }

    /// Pop and play jobs until `report.requested` have played or the queue
    /// runs dry. A failed job is recorded and the next one is tried.
    ///
    /// Returns the last job error, if any. Store failures abort.
    pub(crate) async fn drain(
        &self,
        source: &MediaSource<'_>,
        keying: DurationKeying,
        report: &mut BatchReport,
    ) -> Result<Option<CueError>, CueError> {
        let durations = DurationCache::new(
            Arc::clone(&self.ports.store),
            self.settings.keys.duration_prefix(keying.channel_point_folder),
        );
        let mut last_error = None;

        while report.played.len() < report.requested {
            let Some(job) = self.ledger.pop_front().await? else {
                debug!("playback queue drained");
                break;
            };

            match self.play_job(source, &durations, keying, &job).await {
                Ok(duration_ms) => {
                    self.ledger.record_played(&job).await?;
                    info!(name = %job.display_name, duration_ms, "played media");
                    report.played.push(job);
                }
                Err(err) => {
                    if let Err(hide_err) = source.hide().await {
                        warn!(error = %hide_err, "could not hide media source after failure");
                    }
                    let message = format!("could not play {}: {err}", job.display_name);
                    warn!(name = %job.display_name, error = %err, "media job failed");
                    self.mirror(&message).await;
                    report.failures.push(JobFailure {
                        job,
                        kind: err.kind(),
                        reason: err.to_string(),
                    });
                    last_error = Some(err);
                }
            }
        }
        Ok(last_error)
    }

    /// Load, show, wait out and hide one job. Returns the duration played.
    async fn play_job(
        &self,
        source: &MediaSource<'_>,
        durations: &DurationCache,
        keying: DurationKeying,
        job: &MediaJob,
    ) -> Result<u64, CueError> {
        source.force_hidden().await?;
        source.load_file(&job.file_path).await?;
        source.show().await?;

        let identifier = keying.identifier(job);
        let known = if self.settings.media.reuse_known_durations {
            durations.get(identifier).await?
        } else {
            None
        };
        let duration_ms = match known {
            Some(ms) => {
                debug!(identifier, duration_ms = ms, "using known duration");
                ms
            }
            None => {
                let ms = source.query_duration().await?;
                durations.record(identifier, ms).await?;
                ms
            }
        };

        sleep(Duration::from_millis(duration_ms)).await;
        source.hide().await?;
        Ok(duration_ms)
    }

    async fn report_error(&self, err: &CueError) {
        error!(kind = ?err.kind(), error = %err, "playback failed");
        self.mirror(&format!("Media playback failed: {err}")).await;
    }

    async fn report_shortfall(&self, message: String) {
        warn!("{message}");
        self.mirror(&message).await;
    }

    async fn mirror(&self, message: &str) {
        if self.settings.mirror_errors {
            self.ports.chat.send_message(message).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use rand::SeedableRng;
    use serde_json::json;
    use tokio::time::Instant;

    use crate::config::MediaFolder;
    use crate::domain::{ErrorKind, OutcomeKind};
    use crate::impls::{InMemoryStore, SimulatedObs};
    use crate::ports::{FixedClock, UlidGenerator};

    const SCENE: &str = "Gameplay";
    const SOURCE: &str = "Media Player";

    struct Harness {
        store: Arc<InMemoryStore>,
        obs: Arc<SimulatedObs>,
        library: Arc<crate::impls::FsMediaLibrary>,
        chat: Arc<RecordingChat>,
        dir: tempfile::TempDir,
    }

    #[derive(Default)]
    struct RecordingChat {
        messages: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl ChatSink for RecordingChat {
        async fn send_message(&self, text: &str) {
            self.messages.lock().unwrap().push(text.to_string());
        }
    }

    impl Harness {
        fn new(files: &[&str]) -> Self {
            let dir = tempfile::tempdir().unwrap();
            for name in files {
                let path = dir.path().join(name);
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).unwrap();
                }
                std::fs::write(path, b"").unwrap();
            }
            let obs = SimulatedObs::new(SCENE);
            obs.add_source(SCENE, SOURCE);
            Self {
                store: Arc::new(InMemoryStore::new()),
                obs: Arc::new(obs),
                library: Arc::new(crate::impls::FsMediaLibrary::new()),
                chat: Arc::new(RecordingChat::default()),
                dir,
            }
        }

        fn folder(&self) -> PathBuf {
            self.dir.path().to_path_buf()
        }

        fn path(&self, name: &str) -> String {
            self.folder().join(name).to_string_lossy().into_owned()
        }

        fn settings(&self) -> PlayerSettings {
            PlayerSettings {
                scene: SCENE.to_string(),
                source: SOURCE.to_string(),
                media: MediaConfig {
                    folder: Some(self.folder()),
                    command_files: HashMap::from([("!gina".to_string(), "gina.mp4".to_string())]),
                    reward_files: HashMap::from([("Gratitude".to_string(), "gina.mp4".to_string())]),
                    ..MediaConfig::default()
                },
                mirror_errors: true,
                ..PlayerSettings::default()
            }
        }

        fn player(&self, settings: PlayerSettings) -> MediaPlayer {
            let ports = PlayerPorts {
                store: self.store.clone(),
                obs: self.obs.clone(),
                library: self.library.clone(),
                chat: self.chat.clone(),
                ids: Arc::new(UlidGenerator::new(FixedClock::new(chrono::Utc::now()))),
            };
            MediaPlayer::new(ports, settings, StdRng::seed_from_u64(42))
        }

        async fn queue(&self) -> serde_json::Value {
            self.store.get("DMFL_CURRENT_QUEUE").await.unwrap().unwrap_or(json!(null))
        }

        async fn history(&self) -> serde_json::Value {
            self.store.get("DMFL_LASTPLAYED_QUEUE").await.unwrap().unwrap_or(json!(null))
        }
    }

    fn job(name: &str, path: &str) -> MediaJob {
        MediaJob::new(name, path)
    }

    #[tokio::test(start_paused = true)]
    async fn single_job_scenario_plays_for_measured_duration() {
        let h = Harness::new(&[]);
        h.obs.set_duration("/a.mp4", 4_000);
        let player = h.player(h.settings());
        player.ledger.enqueue(&[job("A", "/a.mp4")]).await.unwrap();

        let source = player.media_source();
        let mut report = BatchReport::new(InvocationId::from_ulid(ulid::Ulid::nil()), 1);
        let keying = DurationKeying {
            channel_point_folder: false,
            by_display_name: false,
        };
        let start = Instant::now();
        let last_error = player.drain(&source, keying, &mut report).await.unwrap();

        assert!(last_error.is_none());
        assert!(start.elapsed() >= Duration::from_millis(4_000));
        assert_eq!(report.played, vec![job("A", "/a.mp4")]);
        assert_eq!(report.kind(), OutcomeKind::Success);
        assert_eq!(h.queue().await, json!([]));
        assert_eq!(h.history().await, json!([{"display_name": "A", "file_path": "/a.mp4"}]));
        assert_eq!(h.obs.calls().show, 1);
        assert!(!h.obs.is_visible(SCENE, SOURCE));
        assert_eq!(
            h.store.get("DMFL_FILE_DURATION_a.mp4").await.unwrap(),
            Some(json!(4000))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn drains_n_of_m_in_fifo_order() {
        let h = Harness::new(&[]);
        let player = h.player(h.settings());
        let jobs: Vec<MediaJob> = (0..5)
            .map(|i| job(&format!("clip{i}"), &format!("/clips/clip{i}.mp4")))
            .collect();
        for j in &jobs {
            h.obs.set_duration(&j.file_path, 1_000);
        }
        player.ledger.enqueue(&jobs).await.unwrap();

        let source = player.media_source();
        let mut report = BatchReport::new(InvocationId::from_ulid(ulid::Ulid::nil()), 3);
        let keying = DurationKeying {
            channel_point_folder: false,
            by_display_name: false,
        };
        player.drain(&source, keying, &mut report).await.unwrap();

        assert_eq!(report.played, jobs[..3].to_vec());
        assert_eq!(player.ledger.history().await.unwrap(), jobs[..3].to_vec());
        assert_eq!(player.ledger.queue().await.unwrap(), jobs[3..].to_vec());
    }

    #[tokio::test(start_paused = true)]
    async fn known_duration_skips_duration_query() {
        let h = Harness::new(&["gina.mp4"]);
        h.store.set("DMFL_FILE_DURATION_gina.mp4", json!(2_500)).await.unwrap();
        let player = h.player(h.settings());

        let outcome = player
            .handle(&Trigger::command("!gina", None))
            .await
            .unwrap();

        assert_eq!(outcome.kind(), OutcomeKind::Success);
        assert_eq!(h.obs.calls().media_duration, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn duration_reuse_can_be_switched_off() {
        let h = Harness::new(&["gina.mp4"]);
        h.store.set("DMFL_FILE_DURATION_gina.mp4", json!(2_500)).await.unwrap();
        h.obs.set_duration(&h.path("gina.mp4"), 3_000);
        let mut settings = h.settings();
        settings.media.reuse_known_durations = false;
        let player = h.player(settings);

        player.handle(&Trigger::command("!gina", None)).await.unwrap();

        assert_eq!(h.obs.calls().media_duration, 1);
        assert_eq!(
            h.store.get("DMFL_FILE_DURATION_gina.mp4").await.unwrap(),
            Some(json!(3000))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn mapped_redemption_keys_duration_by_reward_name() {
        let h = Harness::new(&["gina.mp4"]);
        h.obs.set_duration(&h.path("gina.mp4"), 1_500);
        let player = h.player(h.settings());

        let outcome = player.handle(&Trigger::reward("Gratitude")).await.unwrap();

        let report = outcome.report().unwrap();
        assert_eq!(report.played, vec![job("Gratitude", &h.path("gina.mp4"))]);
        assert_eq!(
            h.store.get("DMFL_FILE_DURATION_Gratitude").await.unwrap(),
            Some(json!(1500))
        );
        assert_eq!(h.store.get("DMFL_STATUS_NOW_PLAYING").await.unwrap(), Some(json!(false)));
    }

    #[tokio::test(start_paused = true)]
    async fn channel_point_redemption_keys_by_reward_name() {
        let h = Harness::new(&["cp/gina.mp4"]);
        h.obs.set_duration(&h.path("cp/gina.mp4"), 1_500);
        let mut settings = h.settings();
        settings.media.channel_point_folder = Some(h.folder().join("cp"));
        settings.media.separate_channel_point_folder = true;
        settings.media.reuse_file_locations = true;
        let player = h.player(settings);

        let outcome = player.handle(&Trigger::reward("Gratitude")).await.unwrap();

        let report = outcome.report().unwrap();
        assert_eq!(report.played, vec![job("Gratitude", &h.path("cp/gina.mp4"))]);
        assert_eq!(
            h.store.get("DMFL_CP_FILE_DURATION_Gratitude").await.unwrap(),
            Some(json!(1500))
        );
        assert_eq!(h.store.get("DMFL_CP_FILE_DURATION_gina.mp4").await.unwrap(), None);
        assert_eq!(h.store.get("DMFL_FILE_DURATION_Gratitude").await.unwrap(), None);
        assert_eq!(
            h.store.get("DMFL_CP_FILE_LOC_Gratitude").await.unwrap(),
            Some(json!(h.path("cp/gina.mp4")))
        );
        assert_eq!(h.store.get("DMFL_FILE_LOC_Gratitude").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn busy_invocation_touches_nothing() {
        let h = Harness::new(&["gina.mp4"]);
        h.store.set("DMFL_STATUS_NOW_PLAYING", json!(true)).await.unwrap();
        h.store.set("DMFL_CURRENT_QUEUE", json!([{"display_name": "x", "file_path": "/x.mp4"}])).await.unwrap();
        let player = h.player(h.settings());

        let outcome = player.handle(&Trigger::command("!gina", None)).await.unwrap();

        assert_eq!(outcome, BatchOutcome::Busy);
        assert_eq!(h.queue().await, json!([{"display_name": "x", "file_path": "/x.mp4"}]));
        assert_eq!(h.history().await, json!(null));
        assert_eq!(h.obs.calls().current_scene, 0);
        assert_eq!(
            h.store.get("DMFL_STATUS_NOW_PLAYING").await.unwrap(),
            Some(json!(true))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_invocations_play_once() {
        let h = Harness::new(&["gina.mp4"]);
        h.obs.set_duration(&h.path("gina.mp4"), 2_000);
        let player = Arc::new(h.player(h.settings()));

        let first = {
            let player = player.clone();
            tokio::spawn(async move { player.handle(&Trigger::command("!gina", None)).await })
        };
        let second = {
            let player = player.clone();
            tokio::spawn(async move { player.handle(&Trigger::command("!gina", None)).await })
        };
        let outcomes = [first.await.unwrap().unwrap(), second.await.unwrap().unwrap()];

        let busy = outcomes.iter().filter(|o| **o == BatchOutcome::Busy).count();
        assert_eq!(busy, 1);
        assert_eq!(player.ledger.history().await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_source_is_not_found_and_flag_untouched() {
        let h = Harness::new(&["gina.mp4"]);
        let mut settings = h.settings();
        settings.source = "Missing Source".to_string();
        let player = h.player(settings);
        let start = Instant::now();

        let err = player.handle(&Trigger::command("!gina", None)).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(start.elapsed() >= Duration::from_millis(5_000));
        assert_eq!(h.store.get("DMFL_STATUS_NOW_PLAYING").await.unwrap(), None);
        assert_eq!(h.queue().await, json!(null));
    }

    #[tokio::test(start_paused = true)]
    async fn configuration_error_never_touches_storage() {
        let h = Harness::new(&["gina.mp4"]);
        let mut settings = h.settings();
        settings.media.folder = None;
        let player = h.player(settings);

        let err = player.handle(&Trigger::command("!gina", None)).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(h.store.get("DMFL_STATUS_NOW_PLAYING").await.unwrap(), None);
        assert_eq!(h.queue().await, json!(null));
        assert_eq!(h.obs.calls().current_scene, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_history_limit_is_rejected_before_playing() {
        let h = Harness::new(&["gina.mp4"]);
        let mut settings = h.settings();
        settings.media.history_limit = Some(0);
        let player = h.player(settings);

        let err = player.handle(&Trigger::command("!gina", None)).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(h.store.get("DMFL_STATUS_NOW_PLAYING").await.unwrap(), None);
        assert_eq!(h.history().await, json!(null));
        assert_eq!(h.obs.calls().current_scene, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnected_obs_is_connectivity_error() {
        let h = Harness::new(&["gina.mp4"]);
        h.obs.set_connected(false);
        let player = h.player(h.settings());

        let err = player.handle(&Trigger::command("!gina", None)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connectivity);
        assert_eq!(h.store.get("DMFL_STATUS_NOW_PLAYING").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn unmapped_trigger_fails_and_clears_flag() {
        let h = Harness::new(&["gina.mp4"]);
        let player = h.player(h.settings());

        let err = player.handle(&Trigger::command("!nothing", None)).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(h.store.get("DMFL_STATUS_NOW_PLAYING").await.unwrap(), Some(json!(false)));
        let messages = h.chat.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("!nothing"));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_job_is_skipped_and_batch_is_partial() {
        let h = Harness::new(&["a.mp4", "b.mp4", "c.mp4"]);
        h.obs.set_duration(&h.path("a.mp4"), 1_000);
        h.obs.set_duration(&h.path("c.mp4"), 1_000);
        let player = h.player(h.settings());
        player
            .ledger
            .enqueue(&[
                job("a.mp4", &h.path("a.mp4")),
                job("b.mp4", &h.path("b.mp4")),
            ])
            .await
            .unwrap();

        let source = player.media_source();
        let mut report = BatchReport::new(InvocationId::from_ulid(ulid::Ulid::nil()), 3);
        let keying = DurationKeying {
            channel_point_folder: false,
            by_display_name: false,
        };
        let last_error = player.drain(&source, keying, &mut report).await.unwrap();

        assert_eq!(report.played.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, ErrorKind::Timeout);
        assert_eq!(report.kind(), OutcomeKind::Partial);
        assert!(matches!(last_error, Some(CueError::Timeout { .. })));
        assert!(!h.obs.is_visible(SCENE, SOURCE));
    }

    #[tokio::test(start_paused = true)]
    async fn random_command_queues_requested_count() {
        let h = Harness::new(&["a.mp4", "b.mov", "nested/c.wav", "notes.txt"]);
        for name in ["a.mp4", "b.mov", "nested/c.wav"] {
            h.obs.set_duration(&h.path(name), 500);
        }
        let mut settings = h.settings();
        settings.media.selection = SelectionPolicy::Random;
        settings.media.count_from_command_input = true;
        let player = h.player(settings);

        let outcome = player
            .handle(&Trigger::command("!random", Some("2".to_string())))
            .await
            .unwrap();

        let report = outcome.report().unwrap();
        assert_eq!(report.requested, 2);
        assert_eq!(report.played.len(), 2);
        assert!(report.played.iter().all(|j| !j.file_path.ends_with(".txt")));

        let err = player
            .handle(&Trigger::command("!random", Some("4".to_string())))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[tokio::test(start_paused = true)]
    async fn random_folder_follows_trigger_name() {
        let h = Harness::new(&["main/a.mp4", "cp/b.mp4"]);
        h.obs.set_duration(&h.path("main/a.mp4"), 500);
        h.obs.set_duration(&h.path("cp/b.mp4"), 500);
        let mut settings = h.settings();
        settings.media.folder = Some(h.folder().join("main"));
        settings.media.channel_point_folder = Some(h.folder().join("cp"));
        settings.media.selection = SelectionPolicy::Random;
        settings.media.random_folders = HashMap::from([
            ("dmflPlayRandomXFiles".to_string(), MediaFolder::Main),
            ("ChannalPointRandom".to_string(), MediaFolder::ChannelPoint),
        ]);
        let player = h.player(settings);

        let main = player
            .handle(&Trigger::command("dmflplayrandomxfiles", None))
            .await
            .unwrap();
        assert_eq!(main.report().unwrap().played, vec![job("a.mp4", &h.path("main/a.mp4"))]);

        let cp = player
            .handle(&Trigger::command("ChannalPointRandom", None))
            .await
            .unwrap();
        assert_eq!(cp.report().unwrap().played, vec![job("b.mp4", &h.path("cp/b.mp4"))]);
        assert_eq!(h.store.get("DMFL_FILE_DURATION_b.mp4").await.unwrap(), Some(json!(500)));

        let err = player.handle(&Trigger::command("!other", None)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(h.store.get("DMFL_STATUS_NOW_PLAYING").await.unwrap(), Some(json!(false)));
    }

    #[tokio::test(start_paused = true)]
    async fn file_location_is_remembered() {
        let h = Harness::new(&["gina.mp4"]);
        h.obs.set_duration(&h.path("gina.mp4"), 500);
        let mut settings = h.settings();
        settings.media.reuse_file_locations = true;
        let player = h.player(settings);

        player.handle(&Trigger::command("!gina", None)).await.unwrap();

        assert_eq!(
            h.store.get("DMFL_FILE_LOC_!gina").await.unwrap(),
            Some(json!(h.path("gina.mp4")))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn status_reports_queue_and_history() {
        let h = Harness::new(&[]);
        let player = h.player(h.settings());
        player.ledger.enqueue(&[job("A", "/a.mp4")]).await.unwrap();
        player.ledger.record_played(&job("B", "/b.mp4")).await.unwrap();

        let status = player.status().await.unwrap();
        assert!(!status.busy);
        assert_eq!(status.queued, vec![job("A", "/a.mp4")]);
        assert_eq!(status.history_len, 1);
        assert_eq!(status.last_played, Some(job("B", "/b.mp4")));
    }

    #[test]
    fn phase_tracker_rejects_skipped_phase() {
        let mut phases = PhaseTracker::new();
        phases.advance(PlaybackPhase::Initializing).unwrap();
        let err = phases.advance(PlaybackPhase::Draining).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InternalInvariant);
    }
}
