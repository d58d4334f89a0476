//! Structured error types for the snapshot simulator.
//!
//! Two families live here. `SimError` covers faults in the driving
//! scenario or in the scheduler itself; they abort the run. A
//! `ProtocolViolation` is an anomaly in the snapshot protocol as
//! observed by one process; it is journaled and the run carries on.

use thiserror::Error;

use crate::process::{MessageKind, ProcessId};
use crate::time::VirtualTime;

/// Fail-fast errors. Any of these aborts `Scheduler::run`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum SimError {
    /// A negative delay was passed to `schedule`.
    #[error("cannot schedule with negative delay {delay}")]
    InvalidSchedule { delay: i64 },

    /// An identity was used that is not in the process registry.
    #[error("process {0} is not registered")]
    UnknownTarget(ProcessId),

    #[error("process {0} is already registered")]
    ProcessAlreadyRegistered(ProcessId),

    /// An event earlier than the current clock reached the front of the
    /// queue. Never happens unless the scheduler itself is broken.
    #[error("clock regression: current time is {current}, next event is at {event}")]
    ClockRegression {
        current: VirtualTime,
        event: VirtualTime,
    },

    #[error("virtual clock overflow scheduling {delay} ticks after {now}")]
    TimeOverflow { now: VirtualTime, delay: u64 },

    /// A fresh episode was requested while channels are still recording.
    #[error("process {0} has a snapshot episode in progress")]
    EpisodeInProgress(ProcessId),

    /// Topology changed while a recorded snapshot still refers to it.
    #[error("process {0} cannot change topology until its snapshot is reset")]
    TopologyLocked(ProcessId),
}

/// Convenience alias for `Result<T, SimError>`.
pub type SimResult<T> = Result<T, SimError>;

/// A protocol anomaly reported by a process without halting the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum ProtocolViolation {
    /// A marker arrived on a channel whose marker was already seen.
    #[error("{process} received a second marker from {from} at {at}")]
    DuplicateMarker {
        process: ProcessId,
        from: ProcessId,
        at: VirtualTime,
    },

    /// A message arrived from an identity not declared as incoming.
    #[error("{process} received {kind} from undeclared neighbor {from} at {at}")]
    UndeclaredNeighbor {
        process: ProcessId,
        from: ProcessId,
        kind: MessageKind,
        at: VirtualTime,
    },
}

impl ProtocolViolation {
    /// The process that observed the violation.
    pub fn process(&self) -> ProcessId {
        match self {
            ProtocolViolation::DuplicateMarker { process, .. }
            | ProtocolViolation::UndeclaredNeighbor { process, .. } => *process,
        }
    }
}
