//! Generic runtime for application orchestration.
//!
//! The Runtime drives the event loop, coordinating between:
//! - [`Session`]: Chat session state machine
//! - [`ChatScreen`]: UI-local screen state
//! - [`Driver`]: Platform-specific I/O

use palaver_client::{Notification, Session, SessionAction, SessionConfig, SessionEvent};
use tracing::{debug, info};

use crate::{ChatScreen, Driver, Input, Intent};

/// Why the runtime stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exit {
    /// The user left the chat.
    Left,
    /// The input source closed.
    InputClosed,
    /// The first connection attempt failed.
    Failed {
        /// Failure reported by the transport.
        reason: String,
    },
}

/// Generic runtime that orchestrates Session, `ChatScreen`, and Driver.
///
/// Holds at most one typing timer deadline and hands it to the driver on
/// every poll.
pub struct Runtime<D: Driver> {
    driver: D,
    session: Session<D::Instant>,
    screen: ChatScreen,
    timer: Option<D::Instant>,
}

impl<D: Driver> Runtime<D> {
    /// Create a runtime for `display_name` on top of `driver`.
    pub fn new(driver: D, display_name: impl Into<String>, config: SessionConfig) -> Self {
        Self {
            driver,
            session: Session::new(display_name, config),
            screen: ChatScreen::new(),
            timer: None,
        }
    }

    /// Run the event loop until the user leaves, input closes, or the first
    /// connection fails.
    ///
    /// The session is torn down and the transport closed on every exit path,
    /// including driver errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(&mut self) -> Result<Exit, D::Error> {
        let result = self.drive().await;
        self.teardown();

        match &result {
            Ok(exit) => info!(?exit, "session ended"),
            Err(e) => info!(error = %e, "session aborted"),
        }
        result
    }

    async fn drive(&mut self) -> Result<Exit, D::Error> {
        if let Some(exit) = self.dispatch(SessionEvent::Start)? {
            return Ok(exit);
        }

        loop {
            let input = self.driver.poll_input(self.timer).await?;
            let exit = match input {
                Input::Key(key) => {
                    let can_compose = self.session.status().is_connected();
                    let intents = self.screen.handle_key(key, can_compose);
                    let exit = self.process_intents(intents)?;
                    self.render()?;
                    exit
                },
                Input::Resize => {
                    self.render()?;
                    None
                },
                Input::Transport(event) => self.dispatch(SessionEvent::Transport(event))?,
                Input::TimerElapsed { now } => {
                    self.timer = None;
                    self.dispatch(SessionEvent::TypingTimerElapsed { now })?
                },
                Input::Closed => Some(Exit::InputClosed),
            };

            if let Some(exit) = exit {
                return Ok(exit);
            }
        }
    }

    fn process_intents(&mut self, intents: Vec<Intent>) -> Result<Option<Exit>, D::Error> {
        for intent in intents {
            let event = match intent {
                Intent::Leave => return Ok(Some(Exit::Left)),
                Intent::Keystroke => SessionEvent::Keystroke { now: self.driver.now() },
                Intent::Send(text) => SessionEvent::SendMessage { text },
            };
            if let Some(exit) = self.dispatch(event)? {
                return Ok(Some(exit));
            }
        }
        Ok(None)
    }

    /// Feed one event to the session and execute its actions.
    ///
    /// Returns the exit reason if the session failed.
    fn dispatch(&mut self, event: SessionEvent<D::Instant>) -> Result<Option<Exit>, D::Error> {
        let mut exit = None;

        for action in self.session.handle(event) {
            match action {
                SessionAction::OpenTransport => self.driver.open()?,
                SessionAction::Emit(command) => self.driver.send(command),
                SessionAction::ArmTypingTimer { deadline } => self.timer = Some(deadline),
                SessionAction::CancelTypingTimer => self.timer = None,
                SessionAction::CloseTransport => self.driver.close(),
                SessionAction::Notify(notification) => {
                    if let Notification::ConnectFailed { reason } = &notification {
                        exit = Some(Exit::Failed { reason: reason.clone() });
                    }
                    self.screen.notify(&notification);
                    self.driver.notify(&notification);
                },
                SessionAction::FollowLatest => self.screen.follow_latest(),
                SessionAction::Render => self.render()?,
            }
        }

        Ok(exit)
    }

    fn render(&mut self) -> Result<(), D::Error> {
        self.driver.render(&self.session.view(), &self.screen)
    }

    fn teardown(&mut self) {
        debug!("tearing down");
        for action in self.session.handle(SessionEvent::Teardown) {
            match action {
                SessionAction::CancelTypingTimer => self.timer = None,
                SessionAction::CloseTransport => self.driver.close(),
                _ => {},
            }
        }
    }

    /// Get a reference to the Session
    pub fn session(&self) -> &Session<D::Instant> {
        &self.session
    }

    /// Get a reference to the screen state
    pub fn screen(&self) -> &ChatScreen {
        &self.screen
    }

    /// Get a reference to the Driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Get a mutable reference to the Driver
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Pending typing timer deadline, if any.
    pub fn timer(&self) -> Option<D::Instant> {
        self.timer
    }
}
