//! Domain model (IDs, jobs, triggers, phases, outcomes, errors).

pub mod errors;
pub mod ids;
pub mod job;
pub mod outcome;
pub mod state;

pub use self::errors::{CueError, ErrorKind};
pub use self::ids::{Id, IdMarker, Invocation, InvocationId};
pub use self::job::{MediaJob, Trigger, TriggerKind};
pub use self::outcome::{BatchOutcome, BatchReport, JobFailure, OutcomeKind};
pub use self::state::PlaybackPhase;
