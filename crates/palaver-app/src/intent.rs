//! User intents produced by the screen.

/// What the user asked for, after key handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// The compose field changed.
    Keystroke,
    /// Send the composed text.
    Send(String),
    /// Leave the chat.
    Leave,
}
