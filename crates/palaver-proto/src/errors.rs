//! Protocol errors.

use thiserror::Error;

/// Convenience alias for protocol results.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding event frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame text is not valid JSON.
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Frame is valid JSON but not a `[name, payload]` array.
    #[error("frame is not an event array")]
    NotAnEvent,

    /// Packet text is empty.
    #[error("empty packet")]
    EmptyPacket,

    /// Packet type prefix is not one the client understands.
    #[error("unknown packet type: {kind}")]
    UnknownPacket {
        /// Type digits found at the start of the packet.
        kind: String,
    },

    /// Event name is not part of the protocol.
    #[error("unknown event: {name}")]
    UnknownEvent {
        /// Name found in the frame.
        name: String,
    },

    /// Payload does not match the shape required by the event.
    #[error("invalid payload for {event}: {source}")]
    InvalidPayload {
        /// Event whose payload failed to decode.
        event: &'static str,
        /// Underlying decode failure.
        source: serde_json::Error,
    },
}
