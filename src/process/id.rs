//! Process ID: a lightweight, ordered, copyable process identifier.

/// A unique identifier for a simulated process.
///
/// Displayed as `P<n>`, so `ProcessId::new(2)` prints as `P2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcessId(u32);

impl ProcessId {
    #[inline]
    pub fn new(id: u32) -> Self {
        ProcessId(id)
    }
}

impl std::fmt::Display for ProcessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.0)
    }
}
