//! Global snapshot assembled from every process's recorded state.

use indexmap::IndexMap;

use crate::process::{LocalState, MessagePayload, Process, ProcessId};

/// One process's contribution to the cut.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcessSnapshot {
    pub local_state: Option<LocalState>,
    /// Finalized incoming channels, in topology order.
    pub channels: IndexMap<ProcessId, Vec<MessagePayload>>,
    pub complete: bool,
}

impl ProcessSnapshot {
    pub fn from_process(process: &Process) -> Self {
        ProcessSnapshot {
            local_state: process.local_state().copied(),
            channels: process
                .recorded_channels()
                .map(|(neighbor, messages)| (neighbor, messages.to_vec()))
                .collect(),
            complete: process.is_complete(),
        }
    }
}

/// The consistent cut: local states plus in-flight channel contents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct GlobalSnapshot {
    /// Per-process state, in registration order.
    pub processes: IndexMap<ProcessId, ProcessSnapshot>,
}

impl GlobalSnapshot {
    pub fn collect<'a>(processes: impl IntoIterator<Item = &'a Process>) -> Self {
        GlobalSnapshot {
            processes: processes
                .into_iter()
                .map(|p| (p.id(), ProcessSnapshot::from_process(p)))
                .collect(),
        }
    }

    /// Every process recorded and closed all of its incoming channels.
    pub fn is_complete(&self) -> bool {
        self.processes.values().all(|p| p.complete)
    }

    /// Total number of messages captured as in flight.
    pub fn in_flight_count(&self) -> usize {
        self.processes
            .values()
            .flat_map(|p| p.channels.values())
            .map(Vec::len)
            .sum()
    }

    /// Whether `payload` was captured on any channel.
    pub fn contains_in_flight(&self, payload: &MessagePayload) -> bool {
        self.processes
            .values()
            .flat_map(|p| p.channels.values())
            .any(|messages| messages.contains(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{Message, ProcessContext};
    use crate::time::VirtualTime;

    #[test]
    fn test_collect_from_processes() {
        let p1 = ProcessId::new(1);
        let p2 = ProcessId::new(2);

        let mut a = Process::new(p1);
        a.setup_topology([p2], [p2]).unwrap();
        let mut b = Process::new(p2);
        b.setup_topology([p1], [p1]).unwrap();

        a.initiate_snapshot(&mut ProcessContext::new(VirtualTime::new(0)));
        a.receive_message(
            &mut ProcessContext::new(VirtualTime::new(1)),
            Message::application(p2, "x"),
        );
        a.receive_message(&mut ProcessContext::new(VirtualTime::new(2)), Message::marker(p2));

        let cut = GlobalSnapshot::collect([&a, &b]);

        assert!(!cut.is_complete());
        assert_eq!(cut.in_flight_count(), 1);
        assert!(cut.contains_in_flight(&MessagePayload::Text("x".into())));
        assert!(cut.processes[&p1].complete);
        assert_eq!(cut.processes[&p2].local_state, None);
    }
}
