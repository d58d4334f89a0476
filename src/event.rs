//! Events, actions, and the ordering key the scheduler sorts them by.
//!
//! An `Event` is an immutable record of "apply this action to this
//! process at this virtual time". Actions are tagged commands rather
//! than closures, so the queue stays `Clone`, `Debug`, and comparable.

use std::cmp::Ordering;

use crate::process::{Message, MessagePayload, ProcessId};
use crate::time::VirtualTime;

// ── Event ID ──────────────────────────────────────────────────────────

/// A strictly-increasing sequence number assigned at scheduling time.
///
/// Two events due at the same `VirtualTime` are dispatched in ascending
/// `EventId` order, i.e. the order in which they were scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct EventId(u64);

impl EventId {
    #[inline]
    pub fn new(raw: u64) -> Self {
        EventId(raw)
    }

    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E#{}", self.0)
    }
}

/// Deterministic event-ID generator. One per scheduler.
#[derive(Debug, Clone, Default)]
pub struct EventIdGen {
    next: u64,
}

impl EventIdGen {
    pub fn new() -> Self {
        EventIdGen { next: 0 }
    }

    /// Mint the next event ID.
    pub fn next_id(&mut self) -> EventId {
        let id = EventId(self.next);
        self.next += 1;
        id
    }

    /// Peek at the next ID without consuming it.
    pub fn peek(&self) -> EventId {
        EventId(self.next)
    }
}

// ── Event Key ─────────────────────────────────────────────────────────

/// Queue key: events are ordered by trigger time, then by sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct EventKey {
    /// When this event should be dispatched.
    pub time: VirtualTime,
    /// Insertion order, breaks ties between equal times.
    pub sequence: EventId,
}

impl Ord for EventKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.time.cmp(&other.time) {
            Ordering::Equal => {}
            ord => return ord,
        }
        self.sequence.cmp(&other.sequence)
    }
}

impl PartialOrd for EventKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ── Action ────────────────────────────────────────────────────────────

/// The operation an event performs on its target process.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Action {
    /// Hand a message that has crossed the network to the target.
    Deliver(Message),
    /// Ask the target to send an application payload to `to`.
    Send {
        to: ProcessId,
        payload: MessagePayload,
    },
    /// Ask the target to start a snapshot episode.
    InitiateSnapshot,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Deliver(message) => write!(f, "Deliver({})", message),
            Action::Send { to, payload } => write!(f, "Send(→ {}, {})", to, payload),
            Action::InitiateSnapshot => write!(f, "InitiateSnapshot"),
        }
    }
}

// ── Event ─────────────────────────────────────────────────────────────

/// A single scheduled event. Owned by the queue until popped.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    pub key: EventKey,
    /// The process the action is bound to.
    pub target: ProcessId,
    pub action: Action,
}

impl Event {
    pub fn new(id: EventId, trigger_time: VirtualTime, target: ProcessId, action: Action) -> Self {
        Event {
            key: EventKey {
                time: trigger_time,
                sequence: id,
            },
            target,
            action,
        }
    }

    #[inline]
    pub fn id(&self) -> EventId {
        self.key.sequence
    }

    #[inline]
    pub fn trigger_time(&self) -> VirtualTime {
        self.key.time
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{} {}] {} on {}",
            self.key.time, self.key.sequence, self.action, self.target
        )
    }
}
