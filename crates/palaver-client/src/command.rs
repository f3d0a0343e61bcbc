//! Outbound command gate.
//!
//! Every user intent headed for the transport passes through here. Nothing is
//! queued: a command refused now is gone, and text typed while disconnected
//! must be resent by the user after reconnecting.
//!
//! The session checks the gate itself on every command since UI state can lag
//! behind the connection. Frontends call the same functions to disable
//! affordances ahead of time.

use palaver_proto::MAX_MESSAGE_CHARS;

use crate::{CommandError, ConnectionStatus};

/// Validate a chat message for sending.
///
/// Returns the trimmed text to put on the wire.
pub fn admit_message(status: &ConnectionStatus, text: &str) -> Result<String, CommandError> {
    require_connected(status)?;

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CommandError::EmptyMessage);
    }

    let length = trimmed.chars().count();
    if length > MAX_MESSAGE_CHARS {
        return Err(CommandError::MessageTooLong { length, limit: MAX_MESSAGE_CHARS });
    }

    Ok(trimmed.to_owned())
}

/// Validate a typing signal for sending.
pub fn admit_typing(status: &ConnectionStatus) -> Result<(), CommandError> {
    require_connected(status)
}

fn require_connected(status: &ConnectionStatus) -> Result<(), CommandError> {
    if status.is_connected() {
        Ok(())
    } else {
        Err(CommandError::NotConnected { status: status.clone() })
    }
}
