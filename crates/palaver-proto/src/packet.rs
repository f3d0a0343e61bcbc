//! Socket.IO v5 packets carried over Engine.IO v4.
//!
//! Every WebSocket text frame is one Engine.IO packet: a single type digit
//! followed by its data. Engine.IO `message` packets (`4`) wrap a Socket.IO
//! packet with its own type digit. Chat events are Socket.IO `EVENT`
//! packets, so an event frame from [`crate::codec`] travels as `42` followed
//! by the frame.
//!
//! ```text
//! server  0{"sid":"..","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}
//! client  40
//! server  40{"sid":".."}
//! client  42["join",{"fullName":"Ada Lovelace"}]
//! server  2
//! client  3
//! ```
//!
//! Only the default namespace is used. Acknowledgements and binary
//! attachments are not part of the chat protocol.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ProtocolError, Result};

/// Engine.IO protocol revision spoken by the client.
pub const ENGINE_IO_VERSION: u8 = 4;

/// Request path a Socket.IO server listens on.
pub const SOCKET_IO_PATH: &str = "/socket.io/";

/// Engine.IO `open` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    /// Engine.IO session id.
    pub sid: String,
    /// Transports the session may upgrade to.
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Milliseconds between server pings.
    pub ping_interval: u64,
    /// Milliseconds the server waits for a pong.
    pub ping_timeout: u64,
    /// Largest packet the server accepts, in bytes.
    #[serde(default)]
    pub max_payload: u64,
}

impl Handshake {
    /// Longest silence from the server before the connection is presumed
    /// dead: one ping interval plus the ping timeout.
    pub fn liveness_window(&self) -> Duration {
        Duration::from_millis(self.ping_interval.saturating_add(self.ping_timeout))
    }
}

/// One packet on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// `0`: Engine.IO session opened.
    Open(Handshake),
    /// `1`: Engine.IO session closed.
    Close,
    /// `2`: server heartbeat; must be answered with [`Packet::Pong`].
    Ping,
    /// `3`: heartbeat answer.
    Pong,
    /// `40`: Socket.IO connect request or acknowledgement.
    Connect,
    /// `41`: Socket.IO disconnect.
    Disconnect,
    /// `42`: Socket.IO event. Holds the `[name, payload]` frame text.
    Event(String),
    /// `44`: the server refused the Socket.IO connect.
    ConnectError(String),
    /// `6`: Engine.IO no-op.
    Noop,
}

impl Packet {
    /// Encode as frame text.
    pub fn encode(&self) -> Result<String> {
        Ok(match self {
            Self::Open(handshake) => format!("0{}", serde_json::to_string(handshake)?),
            Self::Close => "1".to_owned(),
            Self::Ping => "2".to_owned(),
            Self::Pong => "3".to_owned(),
            Self::Connect => "40".to_owned(),
            Self::Disconnect => "41".to_owned(),
            Self::Event(frame) => format!("42{frame}"),
            Self::ConnectError(message) => {
                format!("44{}", serde_json::json!({ "message": message }))
            },
            Self::Noop => "6".to_owned(),
        })
    }

    /// Decode frame text.
    pub fn decode(text: &str) -> Result<Self> {
        let mut chars = text.chars();
        let kind = chars.next().ok_or(ProtocolError::EmptyPacket)?;
        let data = chars.as_str();

        match kind {
            '0' => Ok(Self::Open(serde_json::from_str(data)?)),
            '1' => Ok(Self::Close),
            '2' => Ok(Self::Ping),
            '3' => Ok(Self::Pong),
            '4' => decode_socket_packet(data),
            '6' => Ok(Self::Noop),
            other => Err(ProtocolError::UnknownPacket { kind: other.to_string() }),
        }
    }
}

fn decode_socket_packet(data: &str) -> Result<Packet> {
    let mut chars = data.chars();
    let kind = chars.next().ok_or_else(|| ProtocolError::UnknownPacket { kind: "4".into() })?;
    let body = skip_namespace(chars.as_str());

    match kind {
        '0' => Ok(Packet::Connect),
        '1' => Ok(Packet::Disconnect),
        '2' => Ok(Packet::Event(body.trim_start_matches(|c: char| c.is_ascii_digit()).to_owned())),
        '4' => Ok(Packet::ConnectError(connect_error_message(body))),
        other => Err(ProtocolError::UnknownPacket { kind: format!("4{other}") }),
    }
}

/// Drop a `/namespace,` prefix.
fn skip_namespace(body: &str) -> &str {
    if body.starts_with('/') {
        body.split_once(',').map_or("", |(_, rest)| rest)
    } else {
        body
    }
}

fn connect_error_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(fields)) => match fields.get("message") {
            Some(Value::String(message)) => message.clone(),
            _ => body.to_owned(),
        },
        Ok(Value::String(message)) => message,
        _ => body.to_owned(),
    }
}
