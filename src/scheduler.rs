//! Discrete-event scheduler.
//!
//! Owns the virtual clock, the event queue, the process registry, and
//! the run journal. `run` repeatedly pops the earliest event, advances
//! the clock to it, and hands the action to the target process. Handlers
//! run to completion before the next pop; the loop is single-threaded,
//! so the dispatch order is a pure function of the schedule.

use indexmap::IndexMap;
use tracing::{debug, info, trace, warn};

use crate::cut::GlobalSnapshot;
use crate::error::{ProtocolViolation, SimError, SimResult};
use crate::event::{Action, Event, EventId};
use crate::journal::{Journal, MessageLogEntry, TraceEntry};
use crate::network::NetworkConfig;
use crate::process::{Message, MessagePayload, Outgoing, Process, ProcessContext, ProcessId};
use crate::queue::EventQueue;
use crate::time::VirtualTime;

/// Top-level simulation driver.
#[derive(Debug, Clone)]
pub struct Scheduler {
    clock: VirtualTime,
    queue: EventQueue,
    processes: IndexMap<ProcessId, Process>,
    network: NetworkConfig,
    journal: Journal,
    events_processed: u64,
}

impl Scheduler {
    /// A scheduler at time zero using the default network delay.
    pub fn new() -> Self {
        Self::with_network(NetworkConfig::default())
    }

    pub fn with_network(network: NetworkConfig) -> Self {
        Scheduler {
            clock: VirtualTime::ZERO,
            queue: EventQueue::new(),
            processes: IndexMap::new(),
            network,
            journal: Journal::new(),
            events_processed: 0,
        }
    }

    // ── Registry ──────────────────────────────────────────────────

    pub fn register_process(&mut self, process: Process) -> SimResult<()> {
        let id = process.id();
        if self.processes.contains_key(&id) {
            return Err(SimError::ProcessAlreadyRegistered(id));
        }
        debug!(process = %id, "registered");
        self.processes.insert(id, process);
        Ok(())
    }

    pub fn get_process(&self, id: ProcessId) -> Option<&Process> {
        self.processes.get(&id)
    }

    /// Mutable access, e.g. for wiring topology after registration.
    pub fn process_mut(&mut self, id: ProcessId) -> Option<&mut Process> {
        self.processes.get_mut(&id)
    }

    /// All processes in registration order.
    pub fn processes(&self) -> impl Iterator<Item = &Process> + '_ {
        self.processes.values()
    }

    // ── Scheduling ────────────────────────────────────────────────

    /// Schedule `action` on `target`, `delay` ticks from now.
    pub fn schedule(
        &mut self,
        delay: i64,
        target: ProcessId,
        action: Action,
    ) -> SimResult<EventId> {
        let delay = u64::try_from(delay).map_err(|_| SimError::InvalidSchedule { delay })?;
        if !self.processes.contains_key(&target) {
            return Err(SimError::UnknownTarget(target));
        }
        let at = self.trigger_time(delay)?;
        let id = self.queue.push(at, target, action);
        trace!(event = %id, %target, time = at.ticks(), "scheduled");
        Ok(id)
    }

    /// Schedule `from` to send `payload` to `to` after `delay` ticks.
    pub fn schedule_send(
        &mut self,
        delay: i64,
        from: ProcessId,
        to: ProcessId,
        payload: impl Into<MessagePayload>,
    ) -> SimResult<EventId> {
        if !self.processes.contains_key(&to) {
            return Err(SimError::UnknownTarget(to));
        }
        self.schedule(
            delay,
            from,
            Action::Send {
                to,
                payload: payload.into(),
            },
        )
    }

    /// Schedule `process` to initiate a snapshot after `delay` ticks.
    pub fn schedule_snapshot(&mut self, delay: i64, process: ProcessId) -> SimResult<EventId> {
        self.schedule(delay, process, Action::InitiateSnapshot)
    }

    /// Deliver `message` to `to` after `delay` ticks, bypassing the
    /// network and the message log.
    pub fn schedule_deliver(
        &mut self,
        delay: i64,
        to: ProcessId,
        message: Message,
    ) -> SimResult<EventId> {
        self.schedule(delay, to, Action::Deliver(message))
    }

    fn trigger_time(&self, delay: u64) -> SimResult<VirtualTime> {
        self.clock.plus(delay).ok_or(SimError::TimeOverflow {
            now: self.clock,
            delay,
        })
    }

    // ── Execution ─────────────────────────────────────────────────

    /// Dispatch exactly one event.
    ///
    /// Returns the dispatched event, or `None` when the queue is empty.
    pub fn step(&mut self) -> SimResult<Option<Event>> {
        let Some(event) = self.queue.pop_next() else {
            return Ok(None);
        };

        if event.trigger_time() < self.clock {
            return Err(SimError::ClockRegression {
                current: self.clock,
                event: event.trigger_time(),
            });
        }
        self.clock = event.trigger_time();
        self.events_processed += 1;

        debug!(
            time = self.clock.ticks(),
            event = %event.id(),
            target = %event.target,
            action = %event.action,
            "dispatch"
        );
        self.journal.record_dispatch(TraceEntry {
            time: self.clock,
            event_id: event.id(),
            target: event.target,
            action: event.action.clone(),
        });

        let process = self
            .processes
            .get_mut(&event.target)
            .ok_or(SimError::UnknownTarget(event.target))?;
        let mut ctx = ProcessContext::new(self.clock);
        process.dispatch(&mut ctx, event.action.clone());

        self.apply_effects(event.target, ctx)?;
        Ok(Some(event))
    }

    /// Run until the queue is empty. Returns the number of events
    /// processed during this call.
    pub fn run(&mut self) -> SimResult<u64> {
        let start = self.events_processed;
        info!(time = self.clock.ticks(), pending = self.queue.len(), "simulation starting");
        while self.step()?.is_some() {}
        info!(
            time = self.clock.ticks(),
            events = self.events_processed - start,
            violations = self.journal.violations().len(),
            "simulation finished"
        );
        Ok(self.events_processed - start)
    }

    /// Run until the queue is empty or `max_steps` events have been
    /// dispatched, whichever comes first.
    pub fn run_for(&mut self, max_steps: u64) -> SimResult<u64> {
        let start = self.events_processed;
        for _ in 0..max_steps {
            if self.step()?.is_none() {
                break;
            }
        }
        Ok(self.events_processed - start)
    }

    /// Turn a handler's collected effects into journal entries and
    /// delivery events, in the order the handler produced them.
    fn apply_effects(&mut self, source: ProcessId, ctx: ProcessContext) -> SimResult<()> {
        let ProcessContext {
            outbox,
            violations,
            recorded_local_state,
            ..
        } = ctx;

        for violation in violations {
            self.report_violation(violation);
        }
        if recorded_local_state {
            self.log_snapshot(source);
        }
        for Outgoing { to, message } in outbox {
            self.deliver_later(source, to, message)?;
        }
        Ok(())
    }

    fn deliver_later(&mut self, from: ProcessId, to: ProcessId, message: Message) -> SimResult<()> {
        if !self.processes.contains_key(&to) {
            return Err(SimError::UnknownTarget(to));
        }
        let delay = self.network.delay_between(from, to);
        let at = self.trigger_time(delay)?;
        debug!(%from, %to, kind = %message.kind, arrives = at.ticks(), "send");
        self.log_message(from, to, delay, &message);
        self.queue.push(at, to, Action::Deliver(message));
        Ok(())
    }

    fn report_violation(&mut self, violation: ProtocolViolation) {
        warn!(process = %violation.process(), "protocol violation: {}", violation);
        self.journal.record_violation(violation);
    }

    // ── Logging hooks ─────────────────────────────────────────────

    /// Record a send happening now that arrives `delay` ticks later.
    pub fn log_message(&mut self, src: ProcessId, dst: ProcessId, delay: u64, message: &Message) {
        self.journal
            .record_message(MessageLogEntry::new(src, dst, self.clock, delay, message));
    }

    /// Record the current time as `process`'s first local recording.
    /// Idempotent per process.
    pub fn log_snapshot(&mut self, process: ProcessId) {
        self.journal.record_snapshot(process, self.clock);
    }

    // ── Observation ───────────────────────────────────────────────

    /// Current virtual time.
    pub fn now(&self) -> VirtualTime {
        self.clock
    }

    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_finished(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn message_log(&self) -> &[MessageLogEntry] {
        self.journal.messages()
    }

    pub fn snapshot_log(&self) -> &IndexMap<ProcessId, VirtualTime> {
        self.journal.snapshots()
    }

    pub fn violations(&self) -> &[ProtocolViolation] {
        self.journal.violations()
    }

    pub fn trace(&self) -> &[TraceEntry] {
        self.journal.trace()
    }

    /// Assemble the recorded cut across all registered processes.
    pub fn global_snapshot(&self) -> GlobalSnapshot {
        GlobalSnapshot::collect(self.processes.values())
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::MessageKind;

    fn pid(n: u32) -> ProcessId {
        ProcessId::new(n)
    }

    fn inbox_texts(sched: &Scheduler, id: ProcessId) -> Vec<String> {
        sched
            .get_process(id)
            .map(|p| p.inbox().iter().map(|e| e.payload.to_string()).collect())
            .unwrap_or_default()
    }

    fn receiver_and_sender() -> Scheduler {
        let mut sched = Scheduler::new();
        let mut receiver = Process::new(pid(0));
        receiver.setup_topology([pid(1)], []).unwrap();
        sched.register_process(receiver).unwrap();
        sched.register_process(Process::new(pid(1))).unwrap();
        sched
    }

    #[test]
    fn test_shorter_delay_delivered_first() {
        let mut sched = receiver_and_sender();
        sched.schedule_deliver(10, pid(0), Message::application(pid(1), "A")).unwrap();
        sched.schedule_deliver(2, pid(0), Message::application(pid(1), "B")).unwrap();

        sched.run().unwrap();

        assert_eq!(inbox_texts(&sched, pid(0)), vec!["Text(\"B\")", "Text(\"A\")"]);
        assert_eq!(sched.now(), VirtualTime::new(10));
    }

    #[test]
    fn test_staggered_deliveries_keep_order() {
        let mut sched = receiver_and_sender();
        for (delay, text) in [(5, "M1"), (6, "M2"), (7, "M3")] {
            sched.schedule_deliver(delay, pid(0), Message::application(pid(1), text)).unwrap();
        }

        sched.run().unwrap();

        assert_eq!(
            inbox_texts(&sched, pid(0)),
            vec!["Text(\"M1\")", "Text(\"M2\")", "Text(\"M3\")"]
        );
    }

    #[test]
    fn test_equal_times_follow_schedule_order() {
        let mut sched = receiver_and_sender();
        for text in ["first", "second", "third"] {
            sched.schedule_deliver(4, pid(0), Message::application(pid(1), text)).unwrap();
        }

        sched.run().unwrap();

        let ids: Vec<u64> = sched.trace().iter().map(|t| t.event_id.raw()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(
            inbox_texts(&sched, pid(0)),
            vec!["Text(\"first\")", "Text(\"second\")", "Text(\"third\")"]
        );
    }

    #[test]
    fn test_negative_delay_rejected() {
        let mut sched = receiver_and_sender();
        let err = sched.schedule_snapshot(-1, pid(0)).unwrap_err();
        assert_eq!(err, SimError::InvalidSchedule { delay: -1 });
        assert!(sched.is_finished());
    }

    #[test]
    fn test_unknown_target_rejected_at_schedule() {
        let mut sched = receiver_and_sender();
        assert_eq!(
            sched.schedule_snapshot(0, pid(7)),
            Err(SimError::UnknownTarget(pid(7)))
        );
        assert_eq!(
            sched.schedule_send(0, pid(0), pid(7), "x"),
            Err(SimError::UnknownTarget(pid(7)))
        );
    }

    #[test]
    fn test_unknown_marker_target_aborts_run() {
        let mut sched = Scheduler::new();
        let mut p = Process::new(pid(0));
        p.setup_topology([], [pid(5)]).unwrap();
        sched.register_process(p).unwrap();
        sched.schedule_snapshot(1, pid(0)).unwrap();

        assert_eq!(sched.run(), Err(SimError::UnknownTarget(pid(5))));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut sched = receiver_and_sender();
        assert_eq!(
            sched.register_process(Process::new(pid(1))),
            Err(SimError::ProcessAlreadyRegistered(pid(1)))
        );
    }

    #[test]
    fn test_clock_regression_is_fatal() {
        let mut sched = receiver_and_sender();
        sched.schedule_snapshot(10, pid(0)).unwrap();
        sched.run().unwrap();

        // Bypass `schedule` to plant an event behind the clock.
        sched.queue.push(VirtualTime::new(3), pid(1), Action::InitiateSnapshot);

        assert_eq!(
            sched.step(),
            Err(SimError::ClockRegression {
                current: VirtualTime::new(10),
                event: VirtualTime::new(3),
            })
        );
    }

    #[test]
    fn test_send_logs_and_delivers_after_network_delay() {
        let mut sched = Scheduler::with_network(NetworkConfig::constant(5));
        let mut a = Process::new(pid(1));
        a.setup_topology([], [pid(2)]).unwrap();
        let mut b = Process::new(pid(2));
        b.setup_topology([pid(1)], []).unwrap();
        sched.register_process(a).unwrap();
        sched.register_process(b).unwrap();

        sched.schedule_send(8, pid(1), pid(2), "G").unwrap();
        sched.run().unwrap();

        let log = sched.message_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].send_time, VirtualTime::new(8));
        assert_eq!(log[0].receive_time, VirtualTime::new(13));
        assert_eq!(log[0].kind, MessageKind::Application);

        let inbox = sched.get_process(pid(2)).map(|p| p.inbox().to_vec()).unwrap_or_default();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].at, VirtualTime::new(13));
    }

    #[test]
    fn test_run_for_limits_steps() {
        let mut sched = receiver_and_sender();
        for i in 0..20 {
            sched.schedule_deliver(i, pid(0), Message::application(pid(1), "x")).unwrap();
        }

        assert_eq!(sched.run_for(5).unwrap(), 5);
        assert_eq!(sched.events_processed(), 5);
        assert_eq!(sched.pending(), 15);
        assert!(!sched.is_finished());
    }

    #[test]
    fn test_step_on_empty_queue() {
        let mut sched = Scheduler::new();
        assert_eq!(sched.step(), Ok(None));
        assert_eq!(sched.run(), Ok(0));
    }

    #[test]
    fn test_time_monotonic_across_run() {
        let mut sched = receiver_and_sender();
        for delay in [100, 50, 75, 10] {
            sched.schedule_snapshot(delay, pid(0)).unwrap();
        }
        sched.run().unwrap();

        let times: Vec<u64> = sched.trace().iter().map(|t| t.time.ticks()).collect();
        assert_eq!(times, vec![10, 50, 75, 100]);
    }

    #[test]
    fn test_network_delay_overflow_aborts_run() {
        let mut sched = Scheduler::with_network(NetworkConfig::constant(u64::MAX));
        let mut receiver = Process::new(pid(0));
        receiver.setup_topology([pid(1)], []).unwrap();
        sched.register_process(receiver).unwrap();
        sched.register_process(Process::new(pid(1))).unwrap();
        sched.schedule_send(1, pid(1), pid(0), "never").unwrap();

        assert_eq!(
            sched.run(),
            Err(SimError::TimeOverflow {
                now: VirtualTime::new(1),
                delay: u64::MAX,
            })
        );
        assert!(sched.message_log().is_empty());
    }

    #[test]
    fn test_schedule_past_end_of_time_rejected() {
        let mut sched = receiver_and_sender();
        sched.schedule_snapshot(i64::MAX, pid(0)).unwrap();
        sched.run().unwrap();
        sched.schedule_snapshot(i64::MAX, pid(0)).unwrap();
        sched.run().unwrap();
        assert_eq!(sched.now(), VirtualTime::new(u64::MAX - 1));

        assert_eq!(
            sched.schedule_snapshot(i64::MAX, pid(0)),
            Err(SimError::TimeOverflow {
                now: VirtualTime::new(u64::MAX - 1),
                delay: i64::MAX as u64,
            })
        );
        assert_eq!(sched.schedule_snapshot(1, pid(0)).map(|_| ()), Ok(()));
    }
}
