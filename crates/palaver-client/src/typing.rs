//! Local typing-intent coalescing.
//!
//! Keystrokes arrive at high frequency; the network should only see the
//! transitions. The coalescer tracks a single Idle/Typing intent and a single
//! inactivity deadline:
//!
//! - A keystroke while Idle moves to Typing and asks for `typing=true`.
//! - Every keystroke pushes the deadline to `now + idle_timeout`.
//! - When the deadline passes without a keystroke, the intent returns to Idle
//!   and asks for `typing=false`.
//! - Sending a message forces Idle immediately.
//!
//! The coalescer never touches a clock. Callers pass `now` in and own the
//! actual timer, re-arming it whenever a new deadline is returned.

use std::{ops::Add, time::Duration};

/// Default inactivity delay before the local typing indicator is cleared.
pub const DEFAULT_TYPING_IDLE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Local typing intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingIntent {
    /// Not typing.
    Idle,
    /// Typing; a stop is pending at the deadline.
    Typing,
}

/// Result of a keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keystroke<I> {
    /// `true` if this keystroke started typing and `typing=true` must be sent.
    pub started: bool,
    /// Deadline the single inactivity timer must be re-armed to.
    pub deadline: I,
}

/// Debounces keystrokes into typing transitions.
///
/// Generic over the instant type so tests can drive it with virtual time.
#[derive(Debug, Clone)]
pub struct TypingCoalescer<I = std::time::Instant> {
    idle_timeout: Duration,
    intent: TypingIntent,
    deadline: Option<I>,
}

impl<I> TypingCoalescer<I>
where
    I: Copy + Ord + Add<Duration, Output = I>,
{
    /// Create an idle coalescer.
    pub fn new(idle_timeout: Duration) -> Self {
        Self { idle_timeout, intent: TypingIntent::Idle, deadline: None }
    }

    /// Register a keystroke at `now`.
    pub fn keystroke(&mut self, now: I) -> Keystroke<I> {
        let started = self.intent == TypingIntent::Idle;
        let deadline = now + self.idle_timeout;

        self.intent = TypingIntent::Typing;
        self.deadline = Some(deadline);

        Keystroke { started, deadline }
    }

    /// The inactivity timer fired at `now`.
    ///
    /// Returns `true` if the intent went back to Idle and `typing=false` must
    /// be sent. A fire earlier than the current deadline belongs to a timer
    /// that was since re-armed and is ignored.
    pub fn timer_elapsed(&mut self, now: I) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.intent = TypingIntent::Idle;
                self.deadline = None;
                true
            },
            _ => false,
        }
    }

    /// Force Idle, as on message send.
    ///
    /// Returns `true` if a deadline was pending and the caller's timer must be
    /// cancelled.
    pub fn force_idle(&mut self) -> bool {
        self.intent = TypingIntent::Idle;
        self.deadline.take().is_some()
    }

    /// Current intent.
    pub fn intent(&self) -> TypingIntent {
        self.intent
    }

    /// Pending inactivity deadline, if typing.
    pub fn deadline(&self) -> Option<I> {
        self.deadline
    }

    /// Configured inactivity delay.
    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }
}

impl<I> Default for TypingCoalescer<I>
where
    I: Copy + Ord + Add<Duration, Output = I>,
{
    fn default() -> Self {
        Self::new(DEFAULT_TYPING_IDLE_TIMEOUT)
    }
}
