//! Integration tests for the Runtime against a scripted driver.
//!
//! The driver replays a timeline of inputs under tokio's paused clock and
//! records every command the runtime sends with the virtual time it was sent
//! at.
//!
//! # Oracle Pattern
//!
//! Tests end with oracle checks that verify:
//! - Commands went out at the expected virtual times
//! - The transport was closed exactly as the session required
//! - The runtime exited for the expected reason

#![allow(clippy::unwrap_used)]

use std::{collections::VecDeque, fmt, time::Duration};

use chrono::{TimeZone, Utc};
use palaver_app::{ChatScreen, Driver, Exit, Input, KeyInput, Runtime};
use palaver_client::{
    ChatView, ClientCommand, ConnectionStatus, Message, Notification, ServerEvent, SessionConfig,
    TransportEvent,
};
use tokio::time::{Instant, sleep_until};

/// One scripted input, delivered at `at` after the driver starts.
struct Step {
    at: Duration,
    input: Input<Instant>,
}

fn at(ms: u64, input: Input<Instant>) -> Step {
    Step { at: Duration::from_millis(ms), input }
}

fn key(c: char) -> Input<Instant> {
    Input::Key(KeyInput::Char(c))
}

fn transport(event: TransportEvent) -> Input<Instant> {
    Input::Transport(event)
}

#[derive(Debug)]
struct RenderFailed;

impl fmt::Display for RenderFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("render failed")
    }
}

impl std::error::Error for RenderFailed {}

struct ScriptedDriver {
    start: Instant,
    script: VecDeque<Step>,
    sent: Vec<(Duration, ClientCommand)>,
    opened: usize,
    closed: usize,
    renders: usize,
    notifications: Vec<Notification>,
    last_view: Option<ChatView>,
    fail_render_after: Option<usize>,
}

impl ScriptedDriver {
    fn new(script: impl IntoIterator<Item = Step>) -> Self {
        Self {
            start: Instant::now(),
            script: script.into_iter().collect(),
            sent: Vec::new(),
            opened: 0,
            closed: 0,
            renders: 0,
            notifications: Vec::new(),
            last_view: None,
            fail_render_after: None,
        }
    }

    fn sent_at(&self) -> Vec<(u128, ClientCommand)> {
        self.sent.iter().map(|(t, c)| (t.as_millis(), c.clone())).collect()
    }
}

impl Driver for ScriptedDriver {
    type Error = RenderFailed;
    type Instant = Instant;

    async fn poll_input(&mut self, timer: Option<Instant>) -> Result<Input<Instant>, RenderFailed> {
        let next = self.script.front().map(|step| self.start + step.at);

        match (next, timer) {
            (Some(next), Some(deadline)) if deadline < next => {
                sleep_until(deadline).await;
                Ok(Input::TimerElapsed { now: Instant::now() })
            },
            (Some(next), _) => {
                sleep_until(next).await;
                Ok(self.script.pop_front().map_or(Input::Closed, |step| step.input))
            },
            (None, Some(deadline)) => {
                sleep_until(deadline).await;
                Ok(Input::TimerElapsed { now: Instant::now() })
            },
            (None, None) => Ok(Input::Closed),
        }
    }

    fn open(&mut self) -> Result<(), RenderFailed> {
        self.opened += 1;
        Ok(())
    }

    fn send(&mut self, command: ClientCommand) {
        self.sent.push((Instant::now() - self.start, command));
    }

    fn close(&mut self) {
        self.closed += 1;
    }

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn render(&mut self, view: &ChatView, _screen: &ChatScreen) -> Result<(), RenderFailed> {
        self.renders += 1;
        if self.fail_render_after.is_some_and(|limit| self.renders > limit) {
            return Err(RenderFailed);
        }
        self.last_view = Some(view.clone());
        Ok(())
    }

    fn notify(&mut self, notification: &Notification) {
        self.notifications.push(notification.clone());
    }
}

fn runtime(script: impl IntoIterator<Item = Step>) -> Runtime<ScriptedDriver> {
    Runtime::new(ScriptedDriver::new(script), "Ada Lovelace", SessionConfig::default())
}

#[tokio::test(start_paused = true)]
async fn keystrokes_then_silence() {
    let mut rt = runtime([
        at(0, transport(TransportEvent::Connected)),
        at(0, key('h')),
        at(500, key('i')),
        at(3000, Input::Key(KeyInput::Esc)),
    ]);

    let exit = rt.run().await.unwrap();

    assert_eq!(exit, Exit::Left);
    assert_eq!(
        rt.driver().sent_at(),
        [
            (0, ClientCommand::Join { full_name: "Ada Lovelace".into() }),
            (0, ClientCommand::Typing(true)),
            (1500, ClientCommand::Typing(false)),
        ]
    );
    assert_eq!(rt.driver().closed, 1);
    assert_eq!(rt.timer(), None);
}

#[tokio::test(start_paused = true)]
async fn send_stops_typing_and_cancels_timer() {
    let mut rt = runtime([
        at(0, transport(TransportEvent::Connected)),
        at(100, key('y')),
        at(200, key('o')),
        at(300, Input::Key(KeyInput::Enter)),
        at(5000, Input::Key(KeyInput::Esc)),
    ]);

    rt.run().await.unwrap();

    assert_eq!(
        rt.driver().sent_at(),
        [
            (0, ClientCommand::Join { full_name: "Ada Lovelace".into() }),
            (100, ClientCommand::Typing(true)),
            (300, ClientCommand::Message { content: "yo".into() }),
            (300, ClientCommand::Typing(false)),
        ]
    );
    assert_eq!(rt.screen().input(), "");
}

#[tokio::test(start_paused = true)]
async fn send_while_disconnected_is_dropped() {
    let mut rt = runtime([
        at(0, transport(TransportEvent::Connected)),
        at(10, transport(TransportEvent::Disconnected {
            will_reconnect: false,
            reason: "server went away".into(),
        })),
        at(20, key('h')),
        at(30, Input::Key(KeyInput::Enter)),
        at(40, Input::Key(KeyInput::Esc)),
    ]);

    rt.run().await.unwrap();

    assert_eq!(
        rt.driver().sent_at(),
        [(0, ClientCommand::Join { full_name: "Ada Lovelace".into() })]
    );
    assert_eq!(rt.screen().input(), "");
    assert!(rt.session().log().is_empty());
}

#[tokio::test(start_paused = true)]
async fn connect_failure_exits_and_closes() {
    let mut rt = runtime([at(
        50,
        transport(TransportEvent::ConnectFailed { reason: "connection refused".into() }),
    )]);

    let exit = rt.run().await.unwrap();

    assert_eq!(exit, Exit::Failed { reason: "connection refused".into() });
    assert_eq!(rt.driver().opened, 1);
    assert_eq!(rt.driver().closed, 1);
    assert!(rt.driver().sent.is_empty());
    assert_eq!(
        rt.driver().notifications,
        [Notification::ConnectFailed { reason: "connection refused".into() }]
    );
    assert!(rt.screen().notice().is_some_and(|n| n.is_error()));
}

#[tokio::test(start_paused = true)]
async fn input_closed_still_tears_down() {
    let mut rt = runtime([at(0, transport(TransportEvent::Connected)), at(0, key('x'))]);

    let exit = rt.run().await.unwrap();

    // The pending typing timer fires before the script runs dry.
    assert_eq!(exit, Exit::InputClosed);
    assert_eq!(rt.driver().closed, 1);
    assert_eq!(rt.session().status(), ConnectionStatus::Disconnected);
    assert_eq!(rt.driver().sent.last().map(|(_, c)| c.clone()), Some(ClientCommand::Typing(false)));
}

#[tokio::test(start_paused = true)]
async fn driver_error_still_tears_down() {
    let mut driver = ScriptedDriver::new([
        at(0, transport(TransportEvent::Connected)),
        at(10, Input::Resize),
    ]);
    driver.fail_render_after = Some(2);
    let mut rt = Runtime::new(driver, "Ada Lovelace", SessionConfig::default());

    assert!(rt.run().await.is_err());
    assert_eq!(rt.driver().closed, 1);
}

#[tokio::test(start_paused = true)]
async fn renders_received_messages() {
    let ts = Utc.timestamp_opt(1_714_566_600, 0).single().unwrap();
    let mut rt = runtime([
        at(0, transport(TransportEvent::Connected)),
        at(5, transport(TransportEvent::Received(ServerEvent::Messages(vec![
            Message::user("1", "Bob", "hi", ts),
            Message::user("2", "Ada Lovelace", "hey", ts),
        ])))),
        at(6, Input::Key(KeyInput::Up)),
        at(7, transport(TransportEvent::Received(ServerEvent::Message(Message::user(
            "3", "Bob", "sup", ts,
        ))))),
        at(10, Input::Key(KeyInput::Esc)),
    ]);

    rt.run().await.unwrap();

    let view = rt.driver().last_view.clone().unwrap();
    assert_eq!(view.messages.len(), 3);
    assert!(rt.screen().is_following());
}
