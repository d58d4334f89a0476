//! Simulated network timing.
//!
//! Channels are not objects: a channel is just an ordered `(from, to)`
//! pair. Every message on a channel takes the same number of ticks, so a
//! sender that emits in clock order is delivered in the same order.
//! Non-constant delay on a single channel would break that and would need
//! receiver-side sequencing.

use indexmap::IndexMap;

use crate::process::ProcessId;

/// Delay used for every channel unless overridden.
pub const DEFAULT_DELAY: u64 = 5;

/// Network timing configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct NetworkConfig {
    /// Ticks between send and delivery on every channel without an override.
    pub delay: u64,
    /// Constant per-channel overrides, keyed by `(from, to)`.
    /// Serialized as a list of pairs since the keys are not strings.
    #[cfg_attr(feature = "serialize", serde(default, with = "indexmap::map::serde_seq"))]
    pub channel_delays: IndexMap<(ProcessId, ProcessId), u64>,
}

impl NetworkConfig {
    /// Every channel takes `delay` ticks.
    pub fn constant(delay: u64) -> Self {
        NetworkConfig {
            delay,
            channel_delays: IndexMap::new(),
        }
    }

    /// Give the `from → to` channel its own constant delay.
    pub fn with_channel_delay(mut self, from: ProcessId, to: ProcessId, delay: u64) -> Self {
        self.channel_delays.insert((from, to), delay);
        self
    }

    /// Delay applied to a message sent from `from` to `to`.
    pub fn delay_between(&self, from: ProcessId, to: ProcessId) -> u64 {
        self.channel_delays
            .get(&(from, to))
            .copied()
            .unwrap_or(self.delay)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::constant(DEFAULT_DELAY)
    }
}
