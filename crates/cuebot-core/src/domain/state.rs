//! Playback state machine for one invocation.

use serde::{Deserialize, Serialize};

/// Phase of a single-flight playback invocation.
///
/// State transitions:
/// - Idle -> Initializing -> SourceValidated -> SourceOff -> Enqueuing -> Draining -> Idle
/// - any phase after Idle -> Failed
/// - Idle -> Idle (busy skip, nothing touched)
///
/// Initializing and SourceValidated only read state. The busy flag is taken
/// when leaving SourceValidated and held until the terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackPhase {
    Idle,
    Initializing,
    SourceValidated,
    SourceOff,
    Enqueuing,
    Draining,
    Failed,
}

impl PlaybackPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, PlaybackPhase::Idle | PlaybackPhase::Failed)
    }

    /// Does this phase run with the busy flag held?
    pub fn holds_flight(self) -> bool {
        matches!(
            self,
            PlaybackPhase::SourceOff | PlaybackPhase::Enqueuing | PlaybackPhase::Draining
        )
    }

    /// The forward transition on success. Terminal phases stay put.
    pub fn next(self) -> PlaybackPhase {
        match self {
            PlaybackPhase::Idle => PlaybackPhase::Initializing,
            PlaybackPhase::Initializing => PlaybackPhase::SourceValidated,
            PlaybackPhase::SourceValidated => PlaybackPhase::SourceOff,
            PlaybackPhase::SourceOff => PlaybackPhase::Enqueuing,
            PlaybackPhase::Enqueuing => PlaybackPhase::Draining,
            PlaybackPhase::Draining => PlaybackPhase::Idle,
            PlaybackPhase::Failed => PlaybackPhase::Failed,
        }
    }
}
