//! Terminal driver for the TUI.
//!
//! Implements the [`Driver`] trait for terminal I/O using crossterm for
//! keyboard events and ratatui for rendering. Network goes through the
//! client [`Transport`].

use std::{
    future,
    io::{self, Stdout, stdout},
};

use crossterm::{
    ExecutableCommand,
    cursor::Show,
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use palaver_app::{ChatScreen, Driver, Input, KeyInput};
use palaver_client::{
    ChatView, ClientCommand, Notification,
    transport::{Transport, TransportConfig},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use thiserror::Error;
use tokio::time::{Instant, sleep_until};
use tracing::{info, warn};

use crate::ui;

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Terminal driver implementing the [`Driver`] trait.
///
/// Owns the terminal (raw mode, alternate screen) and the transport. Both
/// are released on drop, whichever way the runtime exits.
pub struct TerminalDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_stream: EventStream,
    endpoint: String,
    config: TransportConfig,
    transport: Option<Transport>,
    /// Whether the transport may still produce events.
    transport_live: bool,
}

impl TerminalDriver {
    /// Take over the terminal. Does not connect until the runtime asks.
    pub fn new(endpoint: impl Into<String>, config: TransportConfig) -> Result<Self, TerminalError> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            event_stream: EventStream::new(),
            endpoint: endpoint.into(),
            config,
            transport: None,
            transport_live: false,
        })
    }

    /// Convert a crossterm key event to `KeyInput`.
    fn convert_key(event: KeyEvent) -> Option<KeyInput> {
        if event.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(event.code, KeyCode::Char('c' | 'd'))
        {
            return Some(KeyInput::Esc);
        }

        match event.code {
            KeyCode::Char(c) => Some(KeyInput::Char(c)),
            KeyCode::Enter => Some(KeyInput::Enter),
            KeyCode::Backspace => Some(KeyInput::Backspace),
            KeyCode::Delete => Some(KeyInput::Delete),
            KeyCode::Esc => Some(KeyInput::Esc),
            KeyCode::Left => Some(KeyInput::Left),
            KeyCode::Right => Some(KeyInput::Right),
            KeyCode::Up => Some(KeyInput::Up),
            KeyCode::Down => Some(KeyInput::Down),
            KeyCode::PageUp => Some(KeyInput::PageUp),
            KeyCode::PageDown => Some(KeyInput::PageDown),
            KeyCode::Home => Some(KeyInput::Home),
            KeyCode::End => Some(KeyInput::End),
            _ => None,
        }
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;
    type Instant = Instant;

    async fn poll_input(&mut self, timer: Option<Instant>) -> Result<Input<Instant>, Self::Error> {
        let Self { event_stream, transport, transport_live, .. } = self;

        loop {
            let live = *transport_live;
            let timer_fired = async {
                match timer {
                    Some(deadline) => sleep_until(deadline).await,
                    None => future::pending().await,
                }
            };
            let transport_event = async {
                match transport.as_mut() {
                    Some(transport) if live => transport.recv().await,
                    _ => future::pending().await,
                }
            };

            let input = tokio::select! {
                biased;

                // Terminal events
                maybe_event = event_stream.next() => match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        Self::convert_key(key).map(Input::Key)
                    },
                    Some(Ok(Event::Resize(..))) => Some(Input::Resize),
                    Some(Ok(_)) => None,
                    Some(Err(e)) => return Err(TerminalError::Io(e)),
                    None => Some(Input::Closed),
                },

                // Transport events
                maybe_event = transport_event => match maybe_event {
                    Some(event) => Some(Input::Transport(event)),
                    None => {
                        *transport_live = false;
                        None
                    },
                },

                // Typing timer
                () = timer_fired => Some(Input::TimerElapsed { now: Instant::now() }),
            };

            if let Some(input) = input {
                return Ok(input);
            }
        }
    }

    fn open(&mut self) -> Result<(), Self::Error> {
        info!(endpoint = %self.endpoint, "opening transport");
        self.transport = Some(Transport::open(&self.endpoint, self.config.clone()));
        self.transport_live = true;
        Ok(())
    }

    fn send(&mut self, command: ClientCommand) {
        match &self.transport {
            Some(transport) => transport.send(command),
            None => warn!(event = command.event_name(), "no transport, dropping command"),
        }
    }

    fn close(&mut self) {
        if let Some(transport) = self.transport.as_mut() {
            transport.close();
        }
        self.transport_live = false;
    }

    fn now(&self) -> Self::Instant {
        Instant::now()
    }

    fn render(&mut self, view: &ChatView, screen: &ChatScreen) -> Result<(), Self::Error> {
        self.terminal.draw(|frame| ui::render(frame, view, screen))?;
        Ok(())
    }

    fn notify(&mut self, notification: &Notification) {
        info!(?notification, "notification");
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        self.close();
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
        let _ = stdout().execute(Show);
    }
}
