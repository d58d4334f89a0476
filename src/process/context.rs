//! `ProcessContext` is the only handle a process has on the outside world.

use crate::error::ProtocolViolation;
use crate::time::VirtualTime;

use super::id::ProcessId;
use super::message::Message;

/// A message a handler asked to send, applied by the scheduler after
/// the handler returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub to: ProcessId,
    pub message: Message,
}

/// Per-dispatch context handed to a process handler.
///
/// Collects the handler's effects in the order they were produced.
/// The scheduler drains them in that same order, which is what keeps a
/// marker behind every application message sent before it on the same
/// channel.
#[derive(Debug, Clone)]
pub struct ProcessContext {
    now: VirtualTime,
    pub(crate) outbox: Vec<Outgoing>,
    pub(crate) violations: Vec<ProtocolViolation>,
    pub(crate) recorded_local_state: bool,
}

impl ProcessContext {
    pub fn new(now: VirtualTime) -> Self {
        ProcessContext {
            now,
            outbox: Vec::new(),
            violations: Vec::new(),
            recorded_local_state: false,
        }
    }

    /// Current virtual time.
    #[inline]
    pub fn now(&self) -> VirtualTime {
        self.now
    }

    /// Queue `message` for delivery to `to`.
    pub fn send(&mut self, to: ProcessId, message: Message) {
        self.outbox.push(Outgoing { to, message });
    }

    /// Report a protocol anomaly. The run continues.
    pub fn report(&mut self, violation: ProtocolViolation) {
        self.violations.push(violation);
    }

    /// Note that the process captured its local state during this dispatch.
    pub fn mark_recorded(&mut self) {
        self.recorded_local_state = true;
    }

    pub fn outbox(&self) -> &[Outgoing] {
        &self.outbox
    }

    pub fn violations(&self) -> &[ProtocolViolation] {
        &self.violations
    }

    pub fn recorded_local_state(&self) -> bool {
        self.recorded_local_state
    }
}
