//! Bounded poller: re-issue a request on a fixed interval until the response
//! is ready or the timeout budget is spent.
//!
//! OBS answers some requests asynchronously, so an empty or half-formed
//! response right after a mutation is normal. Callers pass a readiness
//! predicate and get either the ready response or a `PollTimeout` carrying the
//! last response seen.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

use crate::domain::CueError;
use crate::ports::SceneItem;

/// Retry interval and hard ceiling for one polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollPolicy {
    /// Current scene and scene item queries.
    pub const SCENE_QUERY: PollPolicy = PollPolicy::from_millis(500, 5_000);

    /// Forcing the media source hidden.
    pub const VISIBILITY: PollPolicy = PollPolicy::from_millis(50, 1_000);

    /// Reading back the file path after setting it.
    pub const FILE_CONFIRM: PollPolicy = PollPolicy::from_millis(100, 2_000);

    /// Waiting for OBS to report a media duration.
    pub const MEDIA_DURATION: PollPolicy = PollPolicy::from_millis(100, 5_000);

    /// A zero interval is bumped to 1ms so the loop always makes progress.
    pub const fn new(interval: Duration, timeout: Duration) -> Self {
        let interval = if interval.is_zero() {
            Duration::from_millis(1)
        } else {
            interval
        };
        Self { interval, timeout }
    }

    pub const fn from_millis(interval_ms: u64, timeout_ms: u64) -> Self {
        Self::new(
            Duration::from_millis(interval_ms),
            Duration::from_millis(timeout_ms),
        )
    }
}

/// The budget ran out before a ready response arrived.
#[derive(Debug)]
pub struct PollTimeout<R> {
    pub operation: &'static str,
    pub elapsed: Duration,
    pub attempts: u32,
    /// Last well-formed response that failed the readiness predicate.
    pub last: Option<R>,
}

impl<R> PollTimeout<R> {
    pub fn into_error(self) -> CueError {
        CueError::Timeout {
            operation: self.operation,
            elapsed: self.elapsed,
        }
    }
}

/// Issue `request` until `is_ready` accepts its response.
///
/// - A ready response returns immediately, without a trailing sleep.
/// - `Ok(None)` and transport errors count as "not ready"; errors are logged.
/// - After each unready attempt the poller sleeps `interval`; once the elapsed
///   time reaches `timeout` it gives up, so a timeout lands in
///   `[timeout, timeout + interval)`.
pub async fn poll_until_ready<R, E, F, Fut, P>(
    policy: PollPolicy,
    operation: &'static str,
    mut request: F,
    is_ready: P,
) -> Result<R, PollTimeout<R>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<R>, E>>,
    E: fmt::Display,
    P: Fn(&R) -> bool,
{
    let start = Instant::now();
    let mut attempts = 0u32;
    let mut last = None;

    loop {
        attempts += 1;
        match request().await {
            Ok(Some(response)) if is_ready(&response) => {
                debug!(operation, attempts, "poll ready");
                return Ok(response);
            }
            Ok(Some(response)) => last = Some(response),
            Ok(None) => {}
            Err(e) => warn!(operation, attempt = attempts, error = %e, "poll attempt failed"),
        }

        sleep(policy.interval).await;
        let elapsed = start.elapsed();
        if elapsed >= policy.timeout {
            debug!(operation, attempts, elapsed_ms = elapsed.as_millis() as u64, "poll timed out");
            return Err(PollTimeout {
                operation,
                elapsed,
                attempts,
                last,
            });
        }
    }
}

/// Ready when OBS reported a non-empty scene name.
pub fn has_scene_name(name: &String) -> bool {
    !name.trim().is_empty()
}

/// Ready when the item list names `source` (case-insensitive exact match).
pub fn contains_source(source: &str) -> impl Fn(&Vec<SceneItem>) -> bool + '_ {
    move |items| {
        items
            .iter()
            .any(|item| !item.source_name.is_empty() && item.source_name.eq_ignore_ascii_case(source))
    }
}

/// Ready when the duration is strictly positive; zero means "unknown".
pub fn is_positive_duration(duration_ms: &i64) -> bool {
    *duration_ms > 0
}
