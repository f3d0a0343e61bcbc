//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the runtime from specific I/O
//! implementations. Each frontend implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::{future::Future, ops::Add, time::Duration};

use palaver_client::{ChatView, ClientCommand, Notification, TransportEvent};

use crate::{ChatScreen, KeyInput};

/// Inputs a driver delivers to the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input<I> {
    /// A key was pressed.
    Key(KeyInput),

    /// The display was resized and must be redrawn.
    Resize,

    /// The transport reported something.
    Transport(TransportEvent),

    /// The typing timer deadline passed.
    TimerElapsed {
        /// Time the timer fired.
        now: I,
    },

    /// The input source is gone; the runtime should exit.
    Closed,
}

/// Abstracts I/O operations for the runtime.
///
/// # Implementations
///
/// - **TUI**: crossterm for keys, the client transport for the network
/// - **Tests**: a scripted input timeline under virtual time
///
/// # Associated Types
///
/// - [`Error`](Driver::Error): Platform-specific error type
/// - [`Instant`](Driver::Instant): Time representation (real or virtual)
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Time instant type. Enables virtual time in tests.
    type Instant: Copy + Ord + Send + Sync + Add<Duration, Output = Self::Instant>;

    /// Wait for the next input.
    ///
    /// When `timer` is set and passes before any other input is ready, the
    /// driver returns [`Input::TimerElapsed`].
    fn poll_input(
        &mut self,
        timer: Option<Self::Instant>,
    ) -> impl Future<Output = Result<Input<Self::Instant>, Self::Error>> + Send;

    /// Start connecting. Must not block; the outcome arrives as
    /// [`Input::Transport`].
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot even be started.
    fn open(&mut self) -> Result<(), Self::Error>;

    /// Send a command to the server, fire-and-forget.
    fn send(&mut self, command: ClientCommand);

    /// Close the connection. Idempotent.
    fn close(&mut self);

    /// Current time instant.
    fn now(&self) -> Self::Instant;

    /// Render the session and screen state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, view: &ChatView, screen: &ChatScreen) -> Result<(), Self::Error>;

    /// Surface a notification outside the rendered screen.
    fn notify(&mut self, notification: &Notification) {
        let _ = notification;
    }
}
