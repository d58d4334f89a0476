/// Virtual time for the snapshot simulation.
///
/// A logical timestamp with no dependency on `std::time`. The clock
/// only moves when the scheduler pops an event.

/// A logical tick in simulation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct VirtualTime(u64);

impl VirtualTime {
    /// The zero-point of simulation time.
    pub const ZERO: VirtualTime = VirtualTime(0);

    /// Create a new `VirtualTime` from a raw tick value.
    #[inline]
    pub fn new(ticks: u64) -> Self {
        VirtualTime(ticks)
    }

    /// Return the raw tick value.
    #[inline]
    pub fn ticks(self) -> u64 {
        self.0
    }

    /// The absolute time `delay` ticks after `self`.
    /// Returns `None` on overflow.
    #[inline]
    pub fn plus(self, delay: u64) -> Option<VirtualTime> {
        self.0.checked_add(delay).map(VirtualTime)
    }

    /// Ticks elapsed between `earlier` and `self`, or `None` if
    /// `earlier` is actually later.
    #[inline]
    pub fn duration_since(self, earlier: VirtualTime) -> Option<u64> {
        self.0.checked_sub(earlier.0)
    }
}

impl std::fmt::Display for VirtualTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "T={}", self.0)
    }
}
