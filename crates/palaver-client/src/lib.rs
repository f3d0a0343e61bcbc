//! Client
//!
//! Action-based session state machine for the Palaver chat protocol. Tracks
//! the connection lifecycle, the message log, the presence roster, and typing
//! indicators for one display name in one room.
//!
//! # Architecture
//!
//! The session is Sans-IO. It receives events ([`SessionEvent`]), processes
//! them through pure state machine logic, and returns actions
//! ([`SessionAction`]) for the caller to execute. Transport events, user
//! intents, and timer fires are all serialised through
//! [`Session::handle`], so the session needs no locking.
//!
//! # Components
//!
//! - [`Session`]: Connection lifecycle and room state
//! - [`TypingCoalescer`]: Debounces keystrokes into typing transitions
//! - [`command`]: Gate for outbound user intents
//! - [`ChatView`]: Immutable snapshot for rendering
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides
//! [`transport::Transport`], a tokio connection supervisor with WebSocket and
//! QUIC fallbacks and reconnect backoff.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod command;
mod error;
mod event;
mod session;
mod state;
pub mod typing;
mod view;

#[cfg(feature = "transport")]
pub mod transport;

pub use error::CommandError;
pub use event::{Notification, SessionAction, SessionEvent, TransportEvent};
pub use palaver_proto::{
    ClientCommand, MAX_MESSAGE_CHARS, Message, MessageId, MessageKind, Participant, ServerEvent,
};
pub use session::{Session, SessionConfig};
pub use state::{ConnectionStatus, MessageLog, PresenceSet, SessionState, TypingSet};
pub use typing::{TypingCoalescer, TypingIntent};
pub use view::ChatView;
