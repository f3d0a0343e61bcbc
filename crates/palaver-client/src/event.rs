//! Session events and actions.

use palaver_proto::{ClientCommand, ServerEvent};

/// Everything a transport reports about its connection.
///
/// Failures are events, never errors returned from `open` or `send`. The
/// session decides which of them end the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A connection was established (first connect or reconnect).
    Connected,

    /// An established connection was lost.
    Disconnected {
        /// Whether the transport will try to reconnect on its own.
        will_reconnect: bool,
        /// Why the connection ended.
        reason: String,
    },

    /// A connection attempt failed. After the first connection this means
    /// reconnect attempts are exhausted.
    ConnectFailed {
        /// Why the attempt failed.
        reason: String,
    },

    /// An application event arrived from the server.
    Received(ServerEvent),
}

/// Events the caller feeds into the session.
///
/// The caller is responsible for:
/// - Forwarding transport events in delivery order
/// - Forwarding user intents
/// - Firing the typing timer at the deadline requested via
///   [`SessionAction::ArmTypingTimer`]
///
/// Generic over `I` (Instant type) to support both production
/// (`std::time::Instant`) and virtual time in tests.
#[derive(Debug, Clone)]
pub enum SessionEvent<I = std::time::Instant> {
    /// Begin the session: open the transport.
    Start,

    /// Transport reported something.
    Transport(TransportEvent),

    /// The user edited the compose field.
    Keystroke {
        /// Time of the keystroke.
        now: I,
    },

    /// The typing inactivity timer fired.
    TypingTimerElapsed {
        /// Time the timer fired.
        now: I,
    },

    /// The user wants to send a message.
    SendMessage {
        /// Raw compose-field text; trimmed and validated by the session.
        text: String,
    },

    /// Dispose of the session. Always closes the transport.
    Teardown,
}

/// Actions the session produces for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction<I = std::time::Instant> {
    /// Start a connection attempt.
    OpenTransport,

    /// Send a command to the server.
    Emit(ClientCommand),

    /// (Re)arm the single typing timer, replacing any pending deadline.
    ArmTypingTimer {
        /// When the timer should fire.
        deadline: I,
    },

    /// Cancel the typing timer.
    CancelTypingTimer,

    /// Close the transport. No transport events may be fed in afterwards.
    CloseTransport,

    /// Surface something to the user.
    Notify(Notification),

    /// A new message was appended; scroll to the latest.
    FollowLatest,

    /// The view changed and should be redrawn.
    Render,
}

/// User-facing notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// The first connection attempt failed. Terminal: the session should be
    /// abandoned.
    ConnectFailed {
        /// Failure reported by the transport.
        reason: String,
    },

    /// An established connection was lost.
    ConnectionLost {
        /// Why the connection ended.
        reason: String,
        /// Whether a reconnect is in progress.
        will_reconnect: bool,
    },

    /// The connection came back.
    Reconnected,

    /// The server reported a non-fatal error.
    ApplicationError {
        /// Error text from the server.
        message: String,
    },
}
