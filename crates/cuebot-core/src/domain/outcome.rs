//! Outcome model: what one invocation of the player reports back.
//!
//! The host only needs a success/failure signal plus a message; the report
//! keeps enough detail to explain partial progress afterwards.

use serde::{Deserialize, Serialize};

use super::errors::ErrorKind;
use super::ids::InvocationId;
use super::job::MediaJob;

/// Coarse result classification, serialized as SUCCESS / PARTIAL / BUSY / FAILURE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    /// Every requested job played.
    Success,
    /// At least one job played, fewer than requested.
    Partial,
    /// Another invocation holds the busy flag; nothing was touched.
    Busy,
    /// Nothing played.
    Failure,
}

/// A job that was popped from the queue but could not be played.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFailure {
    pub job: MediaJob,
    pub kind: ErrorKind,
    pub reason: String,
}

/// Progress of one batch through Enqueuing and Draining.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub invocation: InvocationId,
    pub requested: usize,
    pub enqueued: usize,
    pub played: Vec<MediaJob>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<JobFailure>,
}

impl BatchReport {
    pub fn new(invocation: InvocationId, requested: usize) -> Self {
        Self {
            invocation,
            requested,
            enqueued: 0,
            played: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn kind(&self) -> OutcomeKind {
        if self.played.is_empty() {
            OutcomeKind::Failure
        } else if self.played.len() < self.requested {
            OutcomeKind::Partial
        } else {
            OutcomeKind::Success
        }
    }

    /// Requested minus played; zero when the batch fully succeeded.
    pub fn shortfall(&self) -> usize {
        self.requested.saturating_sub(self.played.len())
    }
}

/// Result of `MediaPlayer::handle` when no error aborted the invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "report", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// Skipped because a playback cycle is already in flight.
    Busy,
    /// At least one job played.
    Played(BatchReport),
}

impl BatchOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            BatchOutcome::Busy => OutcomeKind::Busy,
            BatchOutcome::Played(report) => report.kind(),
        }
    }

    pub fn report(&self) -> Option<&BatchReport> {
        match self {
            BatchOutcome::Busy => None,
            BatchOutcome::Played(report) => Some(report),
        }
    }
}
