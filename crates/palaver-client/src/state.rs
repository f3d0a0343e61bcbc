//! Session state types.
//!
//! [`SessionState`] is the full lifecycle tracked by the session;
//! [`ConnectionStatus`] is the coarser projection shown to the user. The
//! collections ([`MessageLog`], [`PresenceSet`], [`TypingSet`]) are owned
//! exclusively by the session and only mutated from its dispatch function.

use std::{
    collections::{BTreeSet, HashSet},
    fmt,
    sync::Arc,
};

use palaver_proto::{Message, MessageId, Participant};

/// Lifecycle of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Created but not started.
    Idle,
    /// First connection attempt in progress.
    Connecting,
    /// Connected and joined.
    Connected,
    /// Connection lost; the transport is retrying.
    Reconnecting,
    /// Connection lost with no retry pending. Outbound commands are no-ops.
    Disconnected,
    /// First connection attempt failed. Absorbing.
    Failed {
        /// Failure reported by the transport.
        reason: String,
    },
    /// Torn down. Absorbing.
    Closed,
}

impl SessionState {
    /// User-facing connection status.
    pub fn status(&self) -> ConnectionStatus {
        match self {
            Self::Idle | Self::Connecting => ConnectionStatus::Connecting,
            Self::Connected => ConnectionStatus::Connected,
            Self::Reconnecting | Self::Disconnected | Self::Closed => {
                ConnectionStatus::Disconnected
            },
            Self::Failed { reason } => ConnectionStatus::Failed(reason.clone()),
        }
    }
}

/// Connection status as presented to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Waiting for the first connection.
    Connecting,
    /// Connected; commands are accepted.
    Connected,
    /// Not connected; commands are rejected.
    Disconnected,
    /// The connection could not be established.
    Failed(String),
}

impl ConnectionStatus {
    /// Whether outbound commands are currently accepted.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => f.write_str("connecting"),
            Self::Connected => f.write_str("connected"),
            Self::Disconnected => f.write_str("disconnected"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Insertion-ordered message history without duplicate ids.
///
/// Ordered by receipt, not by timestamp. The backing vector is shared with
/// views handed out by the session, so snapshots are cheap and never observe
/// later mutation.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Arc<Vec<Message>>,
    ids: HashSet<MessageId>,
}

impl MessageLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole log with a snapshot.
    ///
    /// Duplicate ids inside the snapshot keep their first occurrence.
    pub fn replace(&mut self, snapshot: Vec<Message>) {
        let mut ids = HashSet::with_capacity(snapshot.len());
        let messages: Vec<Message> =
            snapshot.into_iter().filter(|m| ids.insert(m.id.clone())).collect();

        self.ids = ids;
        self.messages = Arc::new(messages);
    }

    /// Append a message unless its id is already present.
    ///
    /// Returns `true` if the message was appended.
    pub fn append(&mut self, message: Message) -> bool {
        if !self.ids.insert(message.id.clone()) {
            return false;
        }
        Arc::make_mut(&mut self.messages).push(message);
        true
    }

    /// Whether a message with this id has been received.
    pub fn contains(&self, id: &MessageId) -> bool {
        self.ids.contains(id)
    }

    /// Messages in receipt order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Shared handle to the current messages.
    pub fn shared(&self) -> Arc<Vec<Message>> {
        Arc::clone(&self.messages)
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Participants from the latest roster snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceSet {
    names: BTreeSet<String>,
}

impl PresenceSet {
    /// Replace the set with a new roster. Nothing from the previous roster is
    /// retained.
    pub fn replace(&mut self, roster: impl IntoIterator<Item = Participant>) {
        self.names = roster.into_iter().map(|p| p.name).collect();
    }

    /// Whether `name` is in the latest roster.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Number of participants.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Peers currently typing, most recent starter last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypingSet {
    names: Vec<String>,
}

impl TypingSet {
    /// Record that `name` started typing. Returns `true` if the set changed.
    pub fn start(&mut self, name: &str) -> bool {
        if self.names.last().is_some_and(|last| last == name) {
            return false;
        }
        self.names.retain(|n| n != name);
        self.names.push(name.to_owned());
        true
    }

    /// Record that `name` stopped typing. Returns `true` if the set changed.
    pub fn stop(&mut self, name: &str) -> bool {
        let before = self.names.len();
        self.names.retain(|n| n != name);
        self.names.len() != before
    }

    /// Forget every peer. Returns `true` if the set changed.
    pub fn clear(&mut self) -> bool {
        let changed = !self.names.is_empty();
        self.names.clear();
        changed
    }

    /// Whether `name` is typing.
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Names in the order they started typing.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of peers typing.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether nobody is typing.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
