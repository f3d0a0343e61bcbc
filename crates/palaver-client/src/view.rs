//! Read-only session snapshot for rendering.

use std::sync::Arc;

use palaver_proto::Message;

use crate::ConnectionStatus;

/// Immutable view of a session at one point in time.
///
/// Produced by [`crate::Session::view`] after each update. Holding a view
/// never blocks or observes later session changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatView {
    /// Connection status.
    pub status: ConnectionStatus,
    /// Local display name.
    pub display_name: Arc<str>,
    /// Message log in receipt order.
    pub messages: Arc<Vec<Message>>,
    /// Participants from the latest roster, sorted.
    pub participants: Vec<String>,
    /// Peers currently typing, in the order they started.
    pub typing_users: Vec<String>,
}

impl ChatView {
    /// Whether the compose field should accept input.
    pub fn can_compose(&self) -> bool {
        self.status.is_connected()
    }

    /// Whether `message` was written by the local participant.
    pub fn is_own(&self, message: &Message) -> bool {
        !message.is_system() && message.sender == *self.display_name
    }

    /// Text for the typing indicator, or `None` when nobody is typing.
    pub fn typing_banner(&self) -> Option<String> {
        match self.typing_users.as_slice() {
            [] => None,
            [only] => Some(format!("{only} is typing...")),
            many => Some(format!("{} people are typing...", many.len())),
        }
    }
}
