//! Error types for the client.

use thiserror::Error;

use crate::ConnectionStatus;

/// Reasons an outbound command is refused before it reaches the transport.
///
/// These are silent at the protocol level: the session drops the command and
/// logs the reason. Frontends may use them to explain a disabled affordance.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The session is not connected.
    #[error("not connected (session is {status})")]
    NotConnected {
        /// Status at the time of the attempt.
        status: ConnectionStatus,
    },

    /// Message text is empty after trimming.
    #[error("message is empty")]
    EmptyMessage,

    /// Message text exceeds the protocol limit.
    #[error("message is {length} characters, limit is {limit}")]
    MessageTooLong {
        /// Length in characters after trimming.
        length: usize,
        /// Maximum accepted length.
        limit: usize,
    },
}
