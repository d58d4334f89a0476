//! # Helios Snapshot: Chandy–Lamport on a Deterministic Kernel
//!
//! A fixed set of simulated processes exchange messages over FIFO
//! point-to-point channels while one of them starts a Chandy–Lamport
//! global snapshot. No async, no threads, no wall-clock time: a single
//! scheduler drives everything from a virtual clock, so every run of the
//! same scenario produces the same cut.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │          Scheduler           │ ← clock, registry, run loop
//! │  ┌────────────────────────┐  │
//! │  │  EventQueue            │  │ ← BTreeMap keyed by (time, sequence)
//! │  └────────────────────────┘  │
//! │  ┌────────────────────────┐  │
//! │  │  Process × N           │  │ ← snapshot state machine
//! │  └────────────────────────┘  │
//! │  ┌────────────────────────┐  │
//! │  │  Journal               │  │ ← message / snapshot / violation logs
//! │  └────────────────────────┘  │
//! └──────────────────────────────┘
//! ```

pub mod cut;
pub mod error;
pub mod event;
pub mod journal;
pub mod network;
pub mod process;
pub mod queue;
pub mod scheduler;
pub mod time;

// Re-exports for convenience.
pub use cut::{GlobalSnapshot, ProcessSnapshot};
pub use error::{ProtocolViolation, SimError, SimResult};
pub use event::{Action, Event, EventId, EventKey};
pub use journal::{Journal, MessageLogEntry, TraceEntry};
pub use network::NetworkConfig;
pub use process::{
    ChannelRecording, LocalState, Message, MessageKind, MessagePayload, Process, ProcessContext,
    ProcessId, SnapshotPhase,
};
pub use scheduler::Scheduler;
pub use time::VirtualTime;
