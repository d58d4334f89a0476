//! Recorded snapshot state: local state, per-channel recordings, phase.

use crate::time::VirtualTime;

use super::id::ProcessId;
use super::message::MessagePayload;

/// The opaque value a process captures when it records its own state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct LocalState {
    /// Clock at the moment of recording.
    pub recorded_at: VirtualTime,
    /// Application messages this process had sent before recording.
    pub messages_sent: u64,
    /// Application messages this process had received before recording.
    pub messages_received: u64,
}

impl std::fmt::Display for LocalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{recorded_at: {}, sent: {}, received: {}}}",
            self.recorded_at, self.messages_sent, self.messages_received
        )
    }
}

/// Recording of one incoming channel during a snapshot episode.
///
/// Open until the neighbor's marker arrives; the messages captured up
/// to that point are the channel's recorded state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelRecording {
    messages: Vec<MessagePayload>,
    closed_at: Option<VirtualTime>,
}

impl ChannelRecording {
    /// A channel still waiting for its marker.
    pub fn open() -> Self {
        ChannelRecording::default()
    }

    /// A channel whose marker is the message that triggered recording,
    /// so nothing can be in flight on it.
    pub fn closed_empty(at: VirtualTime) -> Self {
        ChannelRecording {
            messages: Vec::new(),
            closed_at: Some(at),
        }
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }

    /// Time the marker was observed, if it has been.
    pub fn closed_at(&self) -> Option<VirtualTime> {
        self.closed_at
    }

    pub fn messages(&self) -> &[MessagePayload] {
        &self.messages
    }

    pub(crate) fn record(&mut self, payload: MessagePayload) {
        debug_assert!(self.is_open(), "recording on a closed channel");
        self.messages.push(payload);
    }

    pub(crate) fn close(&mut self, at: VirtualTime) {
        self.closed_at = Some(at);
    }
}

/// Where a process stands in the current snapshot episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum SnapshotPhase {
    /// Local state not recorded yet.
    Normal,
    /// Local state recorded, at least one incoming channel still open.
    Snapshotting,
    /// Every incoming channel has seen its marker.
    Complete,
}

impl std::fmt::Display for SnapshotPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotPhase::Normal => write!(f, "NORMAL"),
            SnapshotPhase::Snapshotting => write!(f, "SNAPSHOTTING"),
            SnapshotPhase::Complete => write!(f, "COMPLETE"),
        }
    }
}

/// An application payload delivered to a process.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct InboxEntry {
    pub at: VirtualTime,
    pub from: ProcessId,
    pub payload: MessagePayload,
}
