//! Session state machine.
//!
//! The `Session` owns the connection lifecycle, the message log, the presence
//! roster, and the typing set for one participation in the room. It is the
//! only writer of that state: every change goes through [`Session::handle`].
//!
//! # States
//!
//! ```text
//! Idle -> Connecting -> Connected <-> Reconnecting
//!              |            |              |
//!              v            v              v
//!           Failed     Disconnected <------+
//! ```
//!
//! `Failed` and `Closed` absorb every event. `Teardown` moves any other state
//! to `Closed` and always closes the transport.

use std::{ops::Add, sync::Arc, time::Duration};

use palaver_proto::{ClientCommand, Message, Participant, ServerEvent};
use tracing::{debug, info, trace, warn};

use crate::{
    ChatView, ConnectionStatus, MessageLog, PresenceSet, SessionState, TypingSet,
    command,
    event::{Notification, SessionAction, SessionEvent, TransportEvent},
    typing::{DEFAULT_TYPING_IDLE_TIMEOUT, TypingCoalescer, TypingIntent},
};

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Inactivity delay before the local typing indicator is cleared.
    pub typing_idle_timeout: Duration,
    /// Replay `join` after the transport reconnects.
    pub rejoin_on_reconnect: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { typing_idle_timeout: DEFAULT_TYPING_IDLE_TIMEOUT, rejoin_on_reconnect: true }
    }
}

/// Chat session for a single display name in a single room.
///
/// Pure state machine: no I/O, no clock. Time is passed in with the events
/// that need it.
#[derive(Debug, Clone)]
pub struct Session<I = std::time::Instant> {
    display_name: Arc<str>,
    config: SessionConfig,
    state: SessionState,
    log: MessageLog,
    presence: PresenceSet,
    typing: TypingSet,
    coalescer: TypingCoalescer<I>,
}

impl<I> Session<I>
where
    I: Copy + Ord + Add<Duration, Output = I>,
{
    /// Create an idle session for `display_name`.
    ///
    /// The name is trusted as already validated by the caller.
    pub fn new(display_name: impl Into<String>, config: SessionConfig) -> Self {
        let coalescer = TypingCoalescer::new(config.typing_idle_timeout);
        Self {
            display_name: Arc::from(display_name.into()),
            config,
            state: SessionState::Idle,
            log: MessageLog::new(),
            presence: PresenceSet::default(),
            typing: TypingSet::default(),
            coalescer,
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: SessionEvent<I>) -> Vec<SessionAction<I>> {
        match (&self.state, &event) {
            (SessionState::Closed, _) => {
                trace!("session closed, dropping event");
                return vec![];
            },
            (SessionState::Failed { .. }, e) if !matches!(e, SessionEvent::Teardown) => {
                trace!("session failed, dropping event");
                return vec![];
            },
            _ => {},
        }

        match event {
            SessionEvent::Start => self.handle_start(),
            SessionEvent::Transport(event) => self.handle_transport(event),
            SessionEvent::Keystroke { now } => self.handle_keystroke(now),
            SessionEvent::TypingTimerElapsed { now } => self.handle_typing_timer(now),
            SessionEvent::SendMessage { text } => self.handle_send_message(&text),
            SessionEvent::Teardown => self.handle_teardown(),
        }
    }

    fn handle_start(&mut self) -> Vec<SessionAction<I>> {
        if self.state != SessionState::Idle {
            debug!(state = ?self.state, "start ignored, session already started");
            return vec![];
        }

        self.state = SessionState::Connecting;
        vec![SessionAction::OpenTransport, SessionAction::Render]
    }

    fn handle_transport(&mut self, event: TransportEvent) -> Vec<SessionAction<I>> {
        match event {
            TransportEvent::Connected => self.handle_connected(),
            TransportEvent::Disconnected { will_reconnect, reason } => {
                self.handle_disconnected(will_reconnect, reason)
            },
            TransportEvent::ConnectFailed { reason } => self.handle_connect_failed(reason),
            TransportEvent::Received(event) => {
                if self.state == SessionState::Connected {
                    self.handle_server_event(event)
                } else {
                    debug!(
                        state = ?self.state,
                        event = event.event_name(),
                        "not connected, dropping server event"
                    );
                    vec![]
                }
            },
        }
    }

    fn handle_connected(&mut self) -> Vec<SessionAction<I>> {
        match self.state {
            SessionState::Connecting => {
                info!(name = %self.display_name, "connected, joining");
                self.state = SessionState::Connected;
                vec![SessionAction::Emit(self.join_command()), SessionAction::Render]
            },
            SessionState::Reconnecting | SessionState::Disconnected => {
                info!(rejoin = self.config.rejoin_on_reconnect, "reconnected");
                self.state = SessionState::Connected;

                let mut actions = Vec::with_capacity(3);
                if self.config.rejoin_on_reconnect {
                    actions.push(SessionAction::Emit(self.join_command()));
                }
                actions.push(SessionAction::Notify(Notification::Reconnected));
                actions.push(SessionAction::Render);
                actions
            },
            _ => {
                debug!(state = ?self.state, "unexpected connected event");
                vec![]
            },
        }
    }

    fn handle_disconnected(
        &mut self,
        will_reconnect: bool,
        reason: String,
    ) -> Vec<SessionAction<I>> {
        match self.state {
            SessionState::Connected => {
                info!(%reason, will_reconnect, "connection lost");
                self.state = if will_reconnect {
                    SessionState::Reconnecting
                } else {
                    SessionState::Disconnected
                };

                let mut actions = self.drop_ephemeral_state();
                actions.push(SessionAction::Notify(Notification::ConnectionLost {
                    reason,
                    will_reconnect,
                }));
                actions.push(SessionAction::Render);
                actions
            },
            SessionState::Reconnecting if !will_reconnect => {
                self.state = SessionState::Disconnected;
                vec![SessionAction::Render]
            },
            SessionState::Connecting if !will_reconnect => self.fail(reason),
            _ => {
                debug!(state = ?self.state, "ignoring disconnect");
                vec![]
            },
        }
    }

    fn handle_connect_failed(&mut self, reason: String) -> Vec<SessionAction<I>> {
        match self.state {
            SessionState::Connecting => self.fail(reason),
            SessionState::Reconnecting => {
                warn!(%reason, "reconnect attempts exhausted");
                self.state = SessionState::Disconnected;
                vec![
                    SessionAction::Notify(Notification::ConnectionLost {
                        reason,
                        will_reconnect: false,
                    }),
                    SessionAction::Render,
                ]
            },
            _ => {
                debug!(state = ?self.state, %reason, "ignoring connect failure");
                vec![]
            },
        }
    }

    fn fail(&mut self, reason: String) -> Vec<SessionAction<I>> {
        warn!(%reason, "connection failed");
        self.state = SessionState::Failed { reason: reason.clone() };
        vec![SessionAction::Notify(Notification::ConnectFailed { reason }), SessionAction::Render]
    }

    fn handle_server_event(&mut self, event: ServerEvent) -> Vec<SessionAction<I>> {
        match event {
            ServerEvent::Messages(snapshot) => self.apply_snapshot(snapshot),
            ServerEvent::Message(message) => self.apply_message(message),
            ServerEvent::Users(roster) => self.apply_roster(roster),
            ServerEvent::UserTyping { user, is_typing } => self.apply_peer_typing(&user, is_typing),
            ServerEvent::Error { message } => {
                warn!(%message, "server reported error");
                vec![SessionAction::Notify(Notification::ApplicationError { message })]
            },
        }
    }

    fn apply_snapshot(&mut self, snapshot: Vec<Message>) -> Vec<SessionAction<I>> {
        debug!(count = snapshot.len(), replaced = self.log.len(), "message snapshot");
        self.log.replace(snapshot);
        vec![SessionAction::FollowLatest, SessionAction::Render]
    }

    fn apply_message(&mut self, message: Message) -> Vec<SessionAction<I>> {
        let id = message.id.clone();
        if self.log.append(message) {
            vec![SessionAction::FollowLatest, SessionAction::Render]
        } else {
            debug!(%id, "duplicate message ignored");
            vec![]
        }
    }

    fn apply_roster(&mut self, roster: Vec<Participant>) -> Vec<SessionAction<I>> {
        self.presence.replace(roster);
        vec![SessionAction::Render]
    }

    fn apply_peer_typing(&mut self, user: &str, is_typing: bool) -> Vec<SessionAction<I>> {
        if user == &*self.display_name {
            trace!("ignoring typing event about ourselves");
            return vec![];
        }

        let changed = if is_typing { self.typing.start(user) } else { self.typing.stop(user) };
        if changed { vec![SessionAction::Render] } else { vec![] }
    }

    fn handle_keystroke(&mut self, now: I) -> Vec<SessionAction<I>> {
        if let Err(e) = command::admit_typing(&self.status()) {
            trace!(%e, "keystroke not signalled");
            return vec![];
        }

        let keystroke = self.coalescer.keystroke(now);
        let mut actions = Vec::with_capacity(2);
        if keystroke.started {
            actions.push(SessionAction::Emit(ClientCommand::Typing(true)));
        }
        actions.push(SessionAction::ArmTypingTimer { deadline: keystroke.deadline });
        actions
    }

    fn handle_typing_timer(&mut self, now: I) -> Vec<SessionAction<I>> {
        if self.coalescer.timer_elapsed(now) && self.state == SessionState::Connected {
            vec![SessionAction::Emit(ClientCommand::Typing(false))]
        } else {
            vec![]
        }
    }

    fn handle_send_message(&mut self, text: &str) -> Vec<SessionAction<I>> {
        let content = match command::admit_message(&self.status(), text) {
            Ok(content) => content,
            Err(e) => {
                debug!(%e, "message not sent");
                return vec![];
            },
        };

        let mut actions = vec![SessionAction::Emit(ClientCommand::Message { content })];
        if self.coalescer.force_idle() {
            actions.push(SessionAction::CancelTypingTimer);
        }
        actions.push(SessionAction::Emit(ClientCommand::Typing(false)));
        actions
    }

    fn handle_teardown(&mut self) -> Vec<SessionAction<I>> {
        debug!(state = ?self.state, "tearing down session");
        self.state = SessionState::Closed;

        let mut actions = Vec::with_capacity(2);
        if self.coalescer.force_idle() {
            actions.push(SessionAction::CancelTypingTimer);
        }
        actions.push(SessionAction::CloseTransport);
        actions
    }

    /// Reset state that cannot be trusted across a connection loss.
    fn drop_ephemeral_state(&mut self) -> Vec<SessionAction<I>> {
        self.typing.clear();
        if self.coalescer.force_idle() {
            vec![SessionAction::CancelTypingTimer]
        } else {
            vec![]
        }
    }

    fn join_command(&self) -> ClientCommand {
        ClientCommand::Join { full_name: self.display_name.to_string() }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// User-facing connection status.
    pub fn status(&self) -> ConnectionStatus {
        self.state.status()
    }

    /// Local display name.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Message log.
    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Latest presence roster.
    pub fn presence(&self) -> &PresenceSet {
        &self.presence
    }

    /// Peers currently typing.
    pub fn typing(&self) -> &TypingSet {
        &self.typing
    }

    /// Local typing intent.
    pub fn typing_intent(&self) -> TypingIntent {
        self.coalescer.intent()
    }

    /// Pending typing deadline, if the local user is typing.
    pub fn typing_deadline(&self) -> Option<I> {
        self.coalescer.deadline()
    }

    /// Snapshot for rendering.
    pub fn view(&self) -> ChatView {
        ChatView {
            status: self.status(),
            display_name: Arc::clone(&self.display_name),
            messages: self.log.shared(),
            participants: self.presence.names().map(str::to_owned).collect(),
            typing_users: self.typing.names().to_vec(),
        }
    }
}
