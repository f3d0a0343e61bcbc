//! Screen state machine.
//!
//! [`ChatScreen`] holds the state that belongs to the UI rather than the
//! session: the compose buffer and cursor, how far the message list is
//! scrolled back, and the last status notice. Keys go in, [`Intent`]s come
//! out.

use palaver_client::{MAX_MESSAGE_CHARS, Notification};

use crate::{Intent, KeyInput};

/// Messages scrolled per page key.
const PAGE: usize = 10;

/// Status line content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Informational, e.g. a reconnect.
    Info(String),
    /// Something went wrong.
    Error(String),
}

impl Notice {
    /// Notice text.
    pub fn text(&self) -> &str {
        match self {
            Self::Info(text) | Self::Error(text) => text,
        }
    }

    /// Whether this notice reports an error.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// UI-local chat screen state.
#[derive(Debug, Clone, Default)]
pub struct ChatScreen {
    /// Compose buffer.
    input: String,
    /// Cursor position in characters.
    cursor: usize,
    /// Messages scrolled back from the latest. Zero follows new messages.
    scroll: usize,
    /// Last status notice. `None` if nothing to show.
    notice: Option<Notice>,
}

impl ChatScreen {
    /// Create an empty screen.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a key and return intents.
    ///
    /// Editing keys are ignored unless `can_compose`; scrolling and leaving
    /// always work.
    pub fn handle_key(&mut self, key: KeyInput, can_compose: bool) -> Vec<Intent> {
        match key {
            KeyInput::Esc => return vec![Intent::Leave],
            KeyInput::Up => {
                self.scroll = self.scroll.saturating_add(1);
                return vec![];
            },
            KeyInput::Down => {
                self.scroll = self.scroll.saturating_sub(1);
                return vec![];
            },
            KeyInput::PageUp => {
                self.scroll = self.scroll.saturating_add(PAGE);
                return vec![];
            },
            KeyInput::PageDown => {
                self.scroll = self.scroll.saturating_sub(PAGE);
                return vec![];
            },
            _ => {},
        }

        if !can_compose {
            return vec![];
        }

        match key {
            KeyInput::Char(c) => self.insert(c),
            KeyInput::Backspace => {
                if self.cursor == 0 {
                    return vec![];
                }
                self.cursor -= 1;
                self.remove_at_cursor()
            },
            KeyInput::Delete => self.remove_at_cursor(),
            KeyInput::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                vec![]
            },
            KeyInput::Right => {
                self.cursor = (self.cursor + 1).min(self.input_chars());
                vec![]
            },
            KeyInput::Home => {
                self.cursor = 0;
                vec![]
            },
            KeyInput::End => {
                self.cursor = self.input_chars();
                vec![]
            },
            KeyInput::Enter => self.submit(),
            KeyInput::Esc
            | KeyInput::Up
            | KeyInput::Down
            | KeyInput::PageUp
            | KeyInput::PageDown => vec![],
        }
    }

    /// Scroll back to the newest message.
    pub fn follow_latest(&mut self) {
        self.scroll = 0;
    }

    /// Record a session notification as the status notice.
    pub fn notify(&mut self, notification: &Notification) {
        let notice = match notification {
            Notification::ConnectFailed { reason } => {
                Notice::Error(format!("Could not connect: {reason}"))
            },
            Notification::ConnectionLost { will_reconnect: true, .. } => {
                Notice::Info("Connection lost, reconnecting...".to_owned())
            },
            Notification::ConnectionLost { reason, will_reconnect: false } => {
                Notice::Error(format!("Connection lost: {reason}"))
            },
            Notification::Reconnected => Notice::Info("Reconnected".to_owned()),
            Notification::ApplicationError { message } => Notice::Error(message.clone()),
        };
        self.notice = Some(notice);
    }

    /// Compose buffer.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Messages scrolled back from the latest.
    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Whether new messages stay in view.
    pub fn is_following(&self) -> bool {
        self.scroll == 0
    }

    /// Current status notice.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    fn input_chars(&self) -> usize {
        self.input.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.input.char_indices().nth(char_index).map_or(self.input.len(), |(i, _)| i)
    }

    fn insert(&mut self, c: char) -> Vec<Intent> {
        if c.is_control() || self.input_chars() >= MAX_MESSAGE_CHARS {
            return vec![];
        }
        let at = self.byte_index(self.cursor);
        self.input.insert(at, c);
        self.cursor += 1;
        vec![Intent::Keystroke]
    }

    fn remove_at_cursor(&mut self) -> Vec<Intent> {
        if self.cursor >= self.input_chars() {
            return vec![];
        }
        let at = self.byte_index(self.cursor);
        self.input.remove(at);
        vec![Intent::Keystroke]
    }

    fn submit(&mut self) -> Vec<Intent> {
        if self.input.trim().is_empty() {
            return vec![];
        }
        let text = std::mem::take(&mut self.input);
        self.cursor = 0;
        self.scroll = 0;
        self.notice = None;
        vec![Intent::Send(text)]
    }
}
