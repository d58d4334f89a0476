//! `Process`: one simulated participant running the Chandy–Lamport
//! snapshot protocol.
//!
//! Phases: NORMAL until the process records its local state (on
//! `initiate_snapshot` or on its first marker), SNAPSHOTTING while some
//! incoming channel has not delivered its marker, COMPLETE once every
//! declared incoming channel has. COMPLETE is derived, never stored.

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, info};

use crate::error::{ProtocolViolation, SimError, SimResult};
use crate::event::Action;

use super::channel::{ChannelRecording, InboxEntry, LocalState, SnapshotPhase};
use super::context::ProcessContext;
use super::id::ProcessId;
use super::message::{Message, MessageKind, MessagePayload};

/// A simulated process.
///
/// Mutated only by its own handlers, which the scheduler invokes one at
/// a time.
#[derive(Debug, Clone)]
pub struct Process {
    id: ProcessId,
    incoming: IndexSet<ProcessId>,
    outgoing: IndexSet<ProcessId>,
    local_state: Option<LocalState>,
    channels: IndexMap<ProcessId, ChannelRecording>,
    inbox: Vec<InboxEntry>,
    messages_sent: u64,
    messages_received: u64,
}

impl Process {
    pub fn new(id: ProcessId) -> Self {
        Process {
            id,
            incoming: IndexSet::new(),
            outgoing: IndexSet::new(),
            local_state: None,
            channels: IndexMap::new(),
            inbox: Vec::new(),
            messages_sent: 0,
            messages_received: 0,
        }
    }

    #[inline]
    pub fn id(&self) -> ProcessId {
        self.id
    }

    // ── Topology ──────────────────────────────────────────────────

    /// Declare the neighbors this process receives from and sends to.
    ///
    /// Markers go out on every `outgoing` channel; recording covers
    /// every `incoming` channel. The channel map is built from
    /// `incoming` at recording time, so the topology is locked from
    /// then until [`Process::reset_snapshot`].
    pub fn setup_topology(
        &mut self,
        incoming: impl IntoIterator<Item = ProcessId>,
        outgoing: impl IntoIterator<Item = ProcessId>,
    ) -> SimResult<()> {
        if self.has_recorded() {
            return Err(SimError::TopologyLocked(self.id));
        }
        self.incoming = incoming.into_iter().collect();
        self.outgoing = outgoing.into_iter().collect();
        Ok(())
    }

    pub fn incoming(&self) -> &IndexSet<ProcessId> {
        &self.incoming
    }

    pub fn outgoing(&self) -> &IndexSet<ProcessId> {
        &self.outgoing
    }

    // ── Dispatch ──────────────────────────────────────────────────

    /// Apply a scheduled action to this process.
    pub fn dispatch(&mut self, ctx: &mut ProcessContext, action: Action) {
        match action {
            Action::Deliver(message) => self.receive_message(ctx, message),
            Action::Send { to, payload } => self.send_message(ctx, to, payload),
            Action::InitiateSnapshot => self.initiate_snapshot(ctx),
        }
    }

    /// Send an application payload to `to`.
    pub fn send_message(
        &mut self,
        ctx: &mut ProcessContext,
        to: ProcessId,
        payload: impl Into<MessagePayload>,
    ) {
        self.messages_sent += 1;
        ctx.send(to, Message::application(self.id, payload));
    }

    /// Start a snapshot episode from this process.
    ///
    /// A no-op once local state has been recorded; a second episode
    /// needs [`Process::reset_snapshot`] first.
    pub fn initiate_snapshot(&mut self, ctx: &mut ProcessContext) {
        if self.local_state.is_some() {
            debug!(
                process = %self.id,
                phase = %self.phase(),
                "snapshot already recorded, ignoring initiate"
            );
            return;
        }
        info!(process = %self.id, time = ctx.now().ticks(), "initiating snapshot");
        self.record_local_state(ctx, None);
    }

    /// Handle a message arriving from a neighbor.
    pub fn receive_message(&mut self, ctx: &mut ProcessContext, message: Message) {
        let from = message.sender;
        let declared = self.incoming.contains(&from);

        match message.kind {
            MessageKind::Marker => {
                if !declared {
                    self.report_undeclared(ctx, from, MessageKind::Marker);
                    return;
                }
                self.on_marker(ctx, from);
            }
            MessageKind::Application => {
                self.messages_received += 1;
                debug!(process = %self.id, %from, payload = %message.payload, "delivered");
                self.inbox.push(InboxEntry {
                    at: ctx.now(),
                    from,
                    payload: message.payload.clone(),
                });

                if !declared {
                    self.report_undeclared(ctx, from, MessageKind::Application);
                    return;
                }
                // Only open channels record: pre-snapshot traffic has no
                // channel entry yet, post-marker traffic finds it closed.
                if let Some(channel) = self.channels.get_mut(&from) {
                    if channel.is_open() {
                        debug!(
                            process = %self.id,
                            %from,
                            payload = %message.payload,
                            "recorded in-flight message"
                        );
                        channel.record(message.payload);
                    }
                }
            }
        }
    }

    fn on_marker(&mut self, ctx: &mut ProcessContext, from: ProcessId) {
        if self.local_state.is_none() {
            debug!(process = %self.id, %from, "first marker");
            self.record_local_state(ctx, Some(from));
            return;
        }

        match self.channels.get_mut(&from) {
            Some(channel) if channel.is_open() => {
                channel.close(ctx.now());
                debug!(
                    process = %self.id,
                    %from,
                    recorded = channel.messages().len(),
                    "channel closed"
                );
                self.log_if_complete(ctx);
            }
            // Every declared neighbor got an entry at recording time.
            _ => ctx.report(ProtocolViolation::DuplicateMarker {
                process: self.id,
                from,
                at: ctx.now(),
            }),
        }
    }

    /// Capture local state, open recording on every incoming channel
    /// except `closed_by`, and send a marker on every outgoing channel.
    fn record_local_state(&mut self, ctx: &mut ProcessContext, closed_by: Option<ProcessId>) {
        let state = LocalState {
            recorded_at: ctx.now(),
            messages_sent: self.messages_sent,
            messages_received: self.messages_received,
        };
        info!(process = %self.id, state = %state, "recorded local state");
        self.local_state = Some(state);
        ctx.mark_recorded();

        let now = ctx.now();
        self.channels = self
            .incoming
            .iter()
            .map(|&neighbor| {
                let recording = if Some(neighbor) == closed_by {
                    ChannelRecording::closed_empty(now)
                } else {
                    ChannelRecording::open()
                };
                (neighbor, recording)
            })
            .collect();

        for &to in &self.outgoing {
            ctx.send(to, Message::marker(self.id));
        }

        self.log_if_complete(ctx);
    }

    fn log_if_complete(&self, ctx: &ProcessContext) {
        if self.is_complete() {
            info!(process = %self.id, time = ctx.now().ticks(), "snapshot complete");
        }
    }

    fn report_undeclared(&self, ctx: &mut ProcessContext, from: ProcessId, kind: MessageKind) {
        let at = ctx.now();
        ctx.report(ProtocolViolation::UndeclaredNeighbor {
            process: self.id,
            from,
            kind,
            at,
        });
    }

    /// Discard the recorded snapshot so a new episode can start.
    ///
    /// Fails while channels are still recording.
    pub fn reset_snapshot(&mut self) -> SimResult<()> {
        if self.phase() == SnapshotPhase::Snapshotting {
            return Err(SimError::EpisodeInProgress(self.id));
        }
        self.local_state = None;
        self.channels.clear();
        Ok(())
    }

    // ── Observation ───────────────────────────────────────────────

    /// Whether local state has been recorded in the current episode.
    #[inline]
    pub fn has_recorded(&self) -> bool {
        self.local_state.is_some()
    }

    pub fn local_state(&self) -> Option<&LocalState> {
        self.local_state.as_ref()
    }

    pub fn phase(&self) -> SnapshotPhase {
        if self.local_state.is_none() {
            SnapshotPhase::Normal
        } else if self.is_complete() {
            SnapshotPhase::Complete
        } else {
            SnapshotPhase::Snapshotting
        }
    }

    /// Every declared incoming channel has seen its marker.
    pub fn is_complete(&self) -> bool {
        self.local_state.is_some()
            && self.incoming.iter().all(|neighbor| {
                self.channels
                    .get(neighbor)
                    .is_some_and(|channel| !channel.is_open())
            })
    }

    /// Raw recording for `neighbor`, open or closed.
    pub fn channel(&self, neighbor: ProcessId) -> Option<&ChannelRecording> {
        self.channels.get(&neighbor)
    }

    /// Final recorded state of the channel from `neighbor`, once its
    /// marker has arrived.
    pub fn channel_state(&self, neighbor: ProcessId) -> Option<&[MessagePayload]> {
        self.channels
            .get(&neighbor)
            .filter(|channel| !channel.is_open())
            .map(ChannelRecording::messages)
    }

    /// Finalized channels in topology order.
    pub fn recorded_channels(&self) -> impl Iterator<Item = (ProcessId, &[MessagePayload])> + '_ {
        self.channels
            .iter()
            .filter(|(_, channel)| !channel.is_open())
            .map(|(&neighbor, channel)| (neighbor, channel.messages()))
    }

    /// Every application message delivered to this process, in order.
    pub fn inbox(&self) -> &[InboxEntry] {
        &self.inbox
    }

    pub fn messages_sent(&self) -> u64 {
        self.messages_sent
    }

    pub fn messages_received(&self) -> u64 {
        self.messages_received
    }
}
