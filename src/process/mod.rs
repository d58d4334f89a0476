//! Simulated processes and the Chandy–Lamport snapshot protocol.
//!
//! A process never touches the scheduler directly. Every handler gets a
//! [`ProcessContext`] carrying the current time; messages and protocol
//! violations are pushed into it and applied by the scheduler once the
//! handler returns.
//!
//! # Module structure
//!
//! | Sub-module | Contents |
//! |---|---|
//! | [`id`] | [`ProcessId`] newtype |
//! | [`message`] | [`Message`], [`MessageKind`], [`MessagePayload`] |
//! | [`context`] | [`ProcessContext`], [`Outgoing`] |
//! | [`channel`] | [`ChannelRecording`], [`LocalState`], [`SnapshotPhase`], [`InboxEntry`] |
//! | [`snapshot`] | [`Process`] and its protocol state machine |

pub mod channel;
pub mod context;
pub mod id;
pub mod message;
pub mod snapshot;

pub use channel::{ChannelRecording, InboxEntry, LocalState, SnapshotPhase};
pub use context::{Outgoing, ProcessContext};
pub use id::ProcessId;
pub use message::{Message, MessageKind, MessagePayload};
pub use snapshot::Process;
