//! Messages exchanged between processes.

use super::id::ProcessId;

// ── MessagePayload ────────────────────────────────────────────────────

/// Opaque application content.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum MessagePayload {
    /// Raw bytes.
    Data(Vec<u8>),
    /// Human-readable text (convenient for scenarios and tests).
    Text(String),
    /// No content. Markers always carry this.
    Empty,
}

impl From<&str> for MessagePayload {
    fn from(s: &str) -> Self {
        MessagePayload::Text(s.to_owned())
    }
}

impl From<String> for MessagePayload {
    fn from(s: String) -> Self {
        MessagePayload::Text(s)
    }
}

impl std::fmt::Display for MessagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessagePayload::Data(d) => write!(f, "Data({} bytes)", d.len()),
            MessagePayload::Text(s) => {
                if s.chars().count() > 32 {
                    let head: String = s.chars().take(32).collect();
                    write!(f, "Text(\"{}…\")", head)
                } else {
                    write!(f, "Text({:?})", s)
                }
            }
            MessagePayload::Empty => write!(f, "Empty"),
        }
    }
}

// ── MessageKind ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum MessageKind {
    /// Ordinary application traffic.
    Application,
    /// Snapshot control message delimiting a channel's recording.
    Marker,
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageKind::Application => write!(f, "APPLICATION"),
            MessageKind::Marker => write!(f, "MARKER"),
        }
    }
}

// ── Message ───────────────────────────────────────────────────────────

/// An immutable unit of communication.
///
/// The sender identity is what tells the receiver which incoming
/// channel the message travelled on.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    pub sender: ProcessId,
    pub payload: MessagePayload,
    pub kind: MessageKind,
}

impl Message {
    pub fn application(sender: ProcessId, payload: impl Into<MessagePayload>) -> Self {
        Message {
            sender,
            payload: payload.into(),
            kind: MessageKind::Application,
        }
    }

    pub fn marker(sender: ProcessId) -> Self {
        Message {
            sender,
            payload: MessagePayload::Empty,
            kind: MessageKind::Marker,
        }
    }

    #[inline]
    pub fn is_marker(&self) -> bool {
        self.kind == MessageKind::Marker
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            MessageKind::Marker => write!(f, "Marker(from={})", self.sender),
            MessageKind::Application => {
                write!(f, "Message(from={}, {})", self.sender, self.payload)
            }
        }
    }
}
