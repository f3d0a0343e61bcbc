//! Protocol
//!
//! Wire vocabulary for the Palaver group-chat protocol. Every exchange over
//! the connection is a named event carrying a JSON payload. Outbound intents
//! are [`ClientCommand`]s, inbound notifications are [`ServerEvent`]s.
//!
//! # Framing
//!
//! A frame is a JSON array `[eventName, payload]`. The [`codec`] module
//! converts between frames and the typed events in both directions so that
//! test servers can speak the protocol with the same code as the client.
//!
//! Over WebSocket each frame rides inside a Socket.IO `EVENT` packet; the
//! [`packet`] module handles that envelope and the Engine.IO heartbeat.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod codec;
pub mod errors;
mod event;
mod message;
pub mod packet;

pub use errors::{ProtocolError, Result};
pub use event::{ClientCommand, Participant, ServerEvent};
pub use message::{MAX_MESSAGE_CHARS, Message, MessageId, MessageKind};
pub use packet::{Handshake, Packet};
