//! Named protocol events.
//!
//! | Direction | Event        | Payload                         |
//! |-----------|--------------|---------------------------------|
//! | out       | `join`       | `{fullName}`                    |
//! | out       | `message`    | `{content}`                     |
//! | out       | `typing`     | boolean                         |
//! | in        | `messages`   | array of [`Message`]            |
//! | in        | `message`    | [`Message`]                     |
//! | in        | `users`      | array of [`Participant`]        |
//! | in        | `userTyping` | `{user, isTyping}`              |
//! | in        | `error`      | `{message}`                     |

use serde::{Deserialize, Serialize};

use crate::Message;

/// A participant entry from a presence roster.
///
/// Servers may attach additional fields; only the name is retained.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    /// Display name.
    pub name: String,
}

impl Participant {
    /// Create a participant entry.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Intents sent from the client to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// Announce the local display name. Sent after every connect.
    Join {
        /// Display name of the local participant.
        full_name: String,
    },

    /// Post a chat message.
    Message {
        /// Trimmed message text, at most 500 characters.
        content: String,
    },

    /// Start or stop the local typing indicator.
    Typing(bool),
}

impl ClientCommand {
    /// Wire name of the event.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Message { .. } => "message",
            Self::Typing(_) => "typing",
        }
    }
}

/// Notifications pushed from the server to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// Snapshot of the room history, delivered after join.
    Messages(Vec<Message>),

    /// A single new message.
    Message(Message),

    /// Snapshot of who is currently in the room.
    Users(Vec<Participant>),

    /// A peer started or stopped typing.
    UserTyping {
        /// Display name of the peer.
        user: String,
        /// `true` when the peer started typing.
        is_typing: bool,
    },

    /// Non-fatal application error.
    Error {
        /// Human-readable description.
        message: String,
    },
}

impl ServerEvent {
    /// Wire name of the event.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Messages(_) => "messages",
            Self::Message(_) => "message",
            Self::Users(_) => "users",
            Self::UserTyping { .. } => "userTyping",
            Self::Error { .. } => "error",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct JoinPayload {
    #[serde(rename = "fullName")]
    pub(crate) full_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct MessagePayload {
    pub(crate) content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct UserTypingPayload {
    pub(crate) user: String,
    #[serde(rename = "isTyping")]
    pub(crate) is_typing: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ErrorPayload {
    pub(crate) message: String,
}
