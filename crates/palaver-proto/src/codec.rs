//! JSON event-frame codec.
//!
//! A frame is the JSON array `[eventName, payload]`. Decoding is strict about
//! the event name and payload shape for the direction being decoded; unknown
//! names are reported as [`ProtocolError::UnknownEvent`] so the transport can
//! log and drop them.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    ClientCommand, Message, Participant, ServerEvent,
    errors::{ProtocolError, Result},
    event::{ErrorPayload, JoinPayload, MessagePayload, UserTypingPayload},
};

/// Encode an outbound command as frame text.
pub fn encode_command(command: &ClientCommand) -> Result<String> {
    let name = command.event_name();
    match command {
        ClientCommand::Join { full_name } => {
            frame(name, &JoinPayload { full_name: full_name.clone() })
        },
        ClientCommand::Message { content } => {
            frame(name, &MessagePayload { content: content.clone() })
        },
        ClientCommand::Typing(is_typing) => frame(name, is_typing),
    }
}

/// Decode frame text into an outbound command (server side of the protocol).
pub fn decode_command(text: &str) -> Result<ClientCommand> {
    let (name, payload) = split(text)?;
    match name.as_str() {
        "join" => {
            let p: JoinPayload = payload_as("join", payload)?;
            Ok(ClientCommand::Join { full_name: p.full_name })
        },
        "message" => {
            let p: MessagePayload = payload_as("message", payload)?;
            Ok(ClientCommand::Message { content: p.content })
        },
        "typing" => Ok(ClientCommand::Typing(payload_as("typing", payload)?)),
        _ => Err(ProtocolError::UnknownEvent { name }),
    }
}

/// Encode an inbound event as frame text (server side of the protocol).
pub fn encode_event(event: &ServerEvent) -> Result<String> {
    let name = event.event_name();
    match event {
        ServerEvent::Messages(messages) => frame(name, messages),
        ServerEvent::Message(message) => frame(name, message),
        ServerEvent::Users(users) => frame(name, users),
        ServerEvent::UserTyping { user, is_typing } => {
            frame(name, &UserTypingPayload { user: user.clone(), is_typing: *is_typing })
        },
        ServerEvent::Error { message } => frame(name, &ErrorPayload { message: message.clone() }),
    }
}

/// Decode frame text into an inbound event.
pub fn decode_event(text: &str) -> Result<ServerEvent> {
    let (name, payload) = split(text)?;
    match name.as_str() {
        "messages" => Ok(ServerEvent::Messages(payload_as::<Vec<Message>>("messages", payload)?)),
        "message" => Ok(ServerEvent::Message(payload_as("message", payload)?)),
        "users" => Ok(ServerEvent::Users(payload_as::<Vec<Participant>>("users", payload)?)),
        "userTyping" => {
            let p: UserTypingPayload = payload_as("userTyping", payload)?;
            Ok(ServerEvent::UserTyping { user: p.user, is_typing: p.is_typing })
        },
        "error" => {
            let p: ErrorPayload = payload_as("error", payload)?;
            Ok(ServerEvent::Error { message: p.message })
        },
        _ => Err(ProtocolError::UnknownEvent { name }),
    }
}

fn frame<T: Serialize + ?Sized>(name: &str, payload: &T) -> Result<String> {
    Ok(serde_json::to_string(&(name, payload))?)
}

/// Split a frame into its event name and payload. A missing payload is `null`.
fn split(text: &str) -> Result<(String, Value)> {
    let Value::Array(mut parts) = serde_json::from_str::<Value>(text)? else {
        return Err(ProtocolError::NotAnEvent);
    };
    if parts.is_empty() || parts.len() > 2 {
        return Err(ProtocolError::NotAnEvent);
    }

    let payload = if parts.len() == 2 { parts.pop().unwrap_or(Value::Null) } else { Value::Null };
    match parts.pop() {
        Some(Value::String(name)) => Ok((name, payload)),
        _ => Err(ProtocolError::NotAnEvent),
    }
}

fn payload_as<T: DeserializeOwned>(event: &'static str, payload: Value) -> Result<T> {
    serde_json::from_value(payload).map_err(|source| ProtocolError::InvalidPayload { event, source })
}
