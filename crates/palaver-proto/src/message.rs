//! Chat messages as delivered by the server.
//!
//! Messages are immutable once received. Identity is the server-assigned
//! [`MessageId`]; two messages with equal ids are the same message regardless
//! of their other fields.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Maximum message length, counted in Unicode scalar values.
pub const MAX_MESSAGE_CHARS: usize = 500;

/// Opaque, server-assigned message identifier.
///
/// Servers send ids either as JSON strings or JSON numbers. Both normalise to
/// their textual form, so `"42"` and `42` name the same message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Create an id from its textual form.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Textual form of the id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for MessageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for MessageId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => Self(text),
            Raw::Number(number) => Self(number.to_string()),
        })
    }
}

/// Origin of a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Written by a participant.
    #[default]
    User,
    /// Generated by the server (joins, leaves, announcements).
    System,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Server-assigned identity.
    pub id: MessageId,
    /// Display name of the author. Empty for some system messages.
    #[serde(default)]
    pub sender: String,
    /// Message text.
    pub content: String,
    /// Server timestamp. Descriptive only; logs are ordered by receipt.
    #[serde(default = "Utc::now", deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    /// User or system message.
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
}

impl Message {
    /// Create a user message.
    pub fn user(
        id: impl Into<MessageId>,
        sender: impl Into<String>,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            sender: sender.into(),
            content: content.into(),
            timestamp,
            kind: MessageKind::User,
        }
    }

    /// Create a system message.
    pub fn system(
        id: impl Into<MessageId>,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            sender: String::new(),
            content: content.into(),
            timestamp,
            kind: MessageKind::System,
        }
    }

    /// Whether the server generated this message.
    pub fn is_system(&self) -> bool {
        self.kind == MessageKind::System
    }
}

/// Accepts RFC 3339 strings and epoch milliseconds.
fn deserialize_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<DateTime<Utc>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Millis(i64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Text(text) => DateTime::parse_from_rfc3339(&text)
            .map(|t| t.with_timezone(&Utc))
            .map_err(serde::de::Error::custom),
        Raw::Millis(ms) => Utc
            .timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {ms}"))),
    }
}
