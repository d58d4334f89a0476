//! JSON round trips for the `serialize` feature.
#![cfg(feature = "serialize")]

use helios_snapshot::{
    Action, Event, GlobalSnapshot, MessageLogEntry, NetworkConfig, Process, ProcessId, Scheduler,
    TraceEntry,
};

fn pid(n: u32) -> ProcessId {
    ProcessId::new(n)
}

fn round_trip<T>(value: &T) -> T
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    let json = serde_json::to_string(value).unwrap();
    serde_json::from_str(&json).unwrap()
}

fn two_process_run(network: NetworkConfig) -> Scheduler {
    let mut sched = Scheduler::with_network(network);
    for (id, peer) in [(1, 2), (2, 1)] {
        let mut p = Process::new(pid(id));
        p.setup_topology([pid(peer)], [pid(peer)]).unwrap();
        sched.register_process(p).unwrap();
    }
    sched.schedule_send(1, pid(2), pid(1), "in flight").unwrap();
    sched.schedule_snapshot(2, pid(1)).unwrap();
    sched
}

#[test]
fn test_network_config_with_channel_overrides() {
    let config = NetworkConfig::constant(3)
        .with_channel_delay(pid(2), pid(1), 10)
        .with_channel_delay(pid(1), pid(3), 7);

    let back = round_trip(&config);

    assert_eq!(back, config);
    assert_eq!(back.delay_between(pid(2), pid(1)), 10);
    assert_eq!(back.channel_delays.keys().next(), Some(&(pid(2), pid(1))));
}

#[test]
fn test_pending_events_round_trip() {
    let mut sched = two_process_run(NetworkConfig::constant(4));

    let first: Event = sched.step().unwrap().unwrap();
    assert!(matches!(first.action, Action::Send { .. }));
    assert_eq!(round_trip(&first), first);

    let second: Event = sched.step().unwrap().unwrap();
    assert_eq!(second.action, Action::InitiateSnapshot);
    assert_eq!(round_trip(&second), second);
}

#[test]
fn test_journal_and_cut_round_trip() {
    let network = NetworkConfig::constant(4).with_channel_delay(pid(2), pid(1), 6);
    let mut sched = two_process_run(network);
    sched.run().unwrap();

    let messages: Vec<MessageLogEntry> = sched.message_log().to_vec();
    assert_eq!(round_trip(&messages), messages);

    let trace: Vec<TraceEntry> = sched.trace().to_vec();
    assert_eq!(round_trip(&trace), trace);

    let cut: GlobalSnapshot = sched.global_snapshot();
    assert!(cut.is_complete());
    assert_eq!(cut.in_flight_count(), 1);
    assert_eq!(round_trip(&cut), cut);
}
