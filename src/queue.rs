//! Deterministic event queue.
//!
//! A `BTreeMap` keyed by `EventKey` acts as the priority queue: the first
//! entry is always the earliest `(trigger_time, sequence)`. Because
//! sequence numbers are strictly increasing, two runs with the same
//! schedule produce the same dispatch order.

use std::collections::BTreeMap;

use crate::event::{Action, Event, EventId, EventIdGen, EventKey};
use crate::process::ProcessId;
use crate::time::VirtualTime;

/// Owns the pending events and the sequence-number generator.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: BTreeMap<EventKey, Event>,
    id_gen: EventIdGen,
}

impl EventQueue {
    pub fn new() -> Self {
        EventQueue {
            events: BTreeMap::new(),
            id_gen: EventIdGen::new(),
        }
    }

    /// Insert an event due at `at`. Returns the sequence number it got.
    pub fn push(&mut self, at: VirtualTime, target: ProcessId, action: Action) -> EventId {
        let id = self.id_gen.next_id();
        let event = Event::new(id, at, target, action);
        self.events.insert(event.key, event);
        id
    }

    /// Pop the next event (earliest time, lowest sequence).
    pub fn pop_next(&mut self) -> Option<Event> {
        self.events.pop_first().map(|(_, event)| event)
    }

    /// Peek at the next event without removing it.
    pub fn peek_next(&self) -> Option<&Event> {
        self.events.first_key_value().map(|(_, event)| event)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// The sequence number the next push will receive.
    pub fn next_event_id(&self) -> EventId {
        self.id_gen.peek()
    }

    /// Drain all events in dispatch order.
    pub fn drain_ordered(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events).into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{Message, MessagePayload};

    fn deliver(text: &str) -> Action {
        Action::Deliver(Message::application(
            ProcessId::new(0),
            MessagePayload::Text(text.into()),
        ))
    }

    #[test]
    fn test_fifo_at_same_time() {
        let mut queue = EventQueue::new();
        let p = ProcessId::new(1);

        queue.push(VirtualTime::new(10), p, deliver("first"));
        queue.push(VirtualTime::new(10), p, deliver("second"));
        queue.push(VirtualTime::new(10), p, deliver("third"));

        let order: Vec<Action> = queue.drain_ordered().into_iter().map(|e| e.action).collect();
        assert_eq!(order, vec![deliver("first"), deliver("second"), deliver("third")]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_time_ordering() {
        let mut queue = EventQueue::new();
        let p = ProcessId::new(1);

        queue.push(VirtualTime::new(10), p, deliver("A"));
        queue.push(VirtualTime::new(2), p, deliver("B"));

        assert_eq!(queue.peek_next().map(|e| e.trigger_time()), Some(VirtualTime::new(2)));
        assert_eq!(queue.pop_next().map(|e| e.action), Some(deliver("B")));
        assert_eq!(queue.pop_next().map(|e| e.action), Some(deliver("A")));
        assert!(queue.pop_next().is_none());
    }

    #[test]
    fn test_mixed_ordering() {
        let mut queue = EventQueue::new();
        let p = ProcessId::new(1);
        for t in [50, 10, 10, 30, 10] {
            queue.push(VirtualTime::new(t), p, Action::InitiateSnapshot);
        }
        assert_eq!(queue.len(), 5);
        assert_eq!(queue.next_event_id(), EventId::new(5));

        let events = queue.drain_ordered();
        for window in events.windows(2) {
            assert!(window[0].key < window[1].key, "out of order: {:?}", window);
        }
    }
}
