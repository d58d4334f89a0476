//! Run journal consumed by reporting and timeline rendering.
//!
//! The scheduler appends to it as a side effect of dispatch. Nothing
//! here is read back by the protocol itself.

use indexmap::IndexMap;

use crate::error::ProtocolViolation;
use crate::event::{Action, EventId};
use crate::process::{Message, MessageKind, MessagePayload, ProcessId};
use crate::time::VirtualTime;

/// One send, as seen by a timeline renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageLogEntry {
    pub src: ProcessId,
    pub dst: ProcessId,
    pub send_time: VirtualTime,
    pub receive_time: VirtualTime,
    pub payload: MessagePayload,
    pub kind: MessageKind,
}

impl MessageLogEntry {
    pub fn new(
        src: ProcessId,
        dst: ProcessId,
        send_time: VirtualTime,
        delay: u64,
        message: &Message,
    ) -> Self {
        MessageLogEntry {
            src,
            dst,
            send_time,
            receive_time: VirtualTime::new(send_time.ticks().saturating_add(delay)),
            payload: message.payload.clone(),
            kind: message.kind,
        }
    }
}

impl std::fmt::Display for MessageLogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} → {} [{} → {}] {}",
            self.src, self.dst, self.send_time, self.receive_time, self.kind
        )?;
        if self.kind == MessageKind::Application {
            write!(f, " {}", self.payload)?;
        }
        Ok(())
    }
}

/// A record of a single event dispatched to a process.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct TraceEntry {
    pub time: VirtualTime,
    pub event_id: EventId,
    pub target: ProcessId,
    pub action: Action,
}

impl std::fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[T={} E=#{} {}] {}",
            self.time.ticks(),
            self.event_id.raw(),
            self.target,
            self.action,
        )
    }
}

/// Append-only logs for a single run.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    messages: Vec<MessageLogEntry>,
    snapshots: IndexMap<ProcessId, VirtualTime>,
    violations: Vec<ProtocolViolation>,
    trace: Vec<TraceEntry>,
}

impl Journal {
    pub fn new() -> Self {
        Journal::default()
    }

    pub fn record_message(&mut self, entry: MessageLogEntry) {
        self.messages.push(entry);
    }

    /// Record when `process` first captured its local state.
    /// Later calls for the same process are ignored.
    pub fn record_snapshot(&mut self, process: ProcessId, at: VirtualTime) {
        self.snapshots.entry(process).or_insert(at);
    }

    pub fn record_violation(&mut self, violation: ProtocolViolation) {
        self.violations.push(violation);
    }

    pub fn record_dispatch(&mut self, entry: TraceEntry) {
        self.trace.push(entry);
    }

    /// Every send in send order.
    pub fn messages(&self) -> &[MessageLogEntry] {
        &self.messages
    }

    /// Process → time of first local recording, in recording order.
    pub fn snapshots(&self) -> &IndexMap<ProcessId, VirtualTime> {
        &self.snapshots
    }

    pub fn violations(&self) -> &[ProtocolViolation] {
        &self.violations
    }

    pub fn trace(&self) -> &[TraceEntry] {
        &self.trace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_log_is_idempotent() {
        let mut journal = Journal::new();
        journal.record_snapshot(ProcessId::new(1), VirtualTime::new(6));
        journal.record_snapshot(ProcessId::new(2), VirtualTime::new(11));
        journal.record_snapshot(ProcessId::new(1), VirtualTime::new(30));

        let entries: Vec<(ProcessId, VirtualTime)> =
            journal.snapshots().iter().map(|(p, t)| (*p, *t)).collect();
        assert_eq!(
            entries,
            vec![
                (ProcessId::new(1), VirtualTime::new(6)),
                (ProcessId::new(2), VirtualTime::new(11)),
            ]
        );
    }

    #[test]
    fn test_message_entry_receive_time() {
        let (p1, p2) = (ProcessId::new(1), ProcessId::new(2));
        let msg = Message::application(p2, "G");
        let entry = MessageLogEntry::new(p2, p1, VirtualTime::new(8), 5, &msg);
        assert_eq!(entry.receive_time, VirtualTime::new(13));
        assert_eq!(entry.kind, MessageKind::Application);
        assert_eq!(entry.to_string(), "P2 → P1 [T=8 → T=13] APPLICATION Text(\"G\")");
    }

    #[test]
    fn test_marker_entry_display_omits_payload() {
        let entry = MessageLogEntry::new(
            ProcessId::new(1),
            ProcessId::new(3),
            VirtualTime::new(6),
            5,
            &Message::marker(ProcessId::new(1)),
        );
        assert_eq!(entry.to_string(), "P1 → P3 [T=6 → T=11] MARKER");
    }
}
