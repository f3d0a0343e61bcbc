//! Terminal-agnostic keyboard input.

/// Keyboard input abstraction.
///
/// Decouples the screen logic from terminal libraries so it can be tested
/// without a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Printable character.
    Char(char),
    /// Enter/Return key (send).
    Enter,
    /// Backspace key (delete character before cursor).
    Backspace,
    /// Delete key (delete character at cursor).
    Delete,
    /// Escape key (leave the chat).
    Esc,
    /// Left arrow key.
    Left,
    /// Right arrow key.
    Right,
    /// Up arrow key (scroll back one message).
    Up,
    /// Down arrow key (scroll forward one message).
    Down,
    /// Page up (scroll back a page).
    PageUp,
    /// Page down (scroll forward a page).
    PageDown,
    /// Home key (cursor to start).
    Home,
    /// End key (cursor to end).
    End,
}
