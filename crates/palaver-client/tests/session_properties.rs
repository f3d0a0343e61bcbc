//! Property-based tests for the Session state machine.
//!
//! Tests verify that invariants hold under arbitrary event sequences:
//! - The message log never holds two messages with the same id
//! - A roster event replaces presence wholesale
//! - Nothing is emitted unless the session is connected
//! - Every typing timer is armed exactly one idle timeout after a keystroke
//! - A keystroke burst inside the idle window signals typing exactly once

#![allow(clippy::unwrap_used)]

use std::{
    collections::{BTreeSet, HashSet},
    time::{Duration, Instant},
};

use chrono::{TimeZone, Utc};
use palaver_client::{
    ClientCommand, ConnectionStatus, Message, Participant, ServerEvent, Session, SessionAction,
    SessionConfig, SessionEvent, TransportEvent,
};
use proptest::prelude::*;

const NAME: &str = "Ada";

#[derive(Debug, Clone)]
enum Step {
    Connect,
    Drop { will_reconnect: bool },
    ConnectFailed,
    Snapshot(Vec<u8>),
    Push(u8),
    Roster(Vec<u8>),
    PeerTyping(u8, bool),
    Keystroke { after_ms: u64 },
    TimerFire { after_ms: u64 },
    Send(String),
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        2 => Just(Step::Connect),
        1 => any::<bool>().prop_map(|will_reconnect| Step::Drop { will_reconnect }),
        1 => Just(Step::ConnectFailed),
        2 => prop::collection::vec(0u8..32, 0..8).prop_map(Step::Snapshot),
        4 => (0u8..32).prop_map(Step::Push),
        2 => prop::collection::vec(0u8..8, 0..6).prop_map(Step::Roster),
        2 => (0u8..4, any::<bool>()).prop_map(|(p, t)| Step::PeerTyping(p, t)),
        3 => (0u64..1500).prop_map(|after_ms| Step::Keystroke { after_ms }),
        2 => (0u64..2500).prop_map(|after_ms| Step::TimerFire { after_ms }),
        2 => "[ a-z]{0,12}".prop_map(Step::Send),
    ]
}

fn message(id: u8) -> Message {
    let ts = Utc.timestamp_opt(1_714_566_600 + i64::from(id), 0).single().unwrap();
    Message::user(id.to_string(), "Bob", format!("message {id}"), ts)
}

fn peer(n: u8) -> String {
    format!("peer-{n}")
}

fn to_event(step: &Step, now: Instant) -> SessionEvent {
    match step {
        Step::Connect => SessionEvent::Transport(TransportEvent::Connected),
        Step::Drop { will_reconnect } => SessionEvent::Transport(TransportEvent::Disconnected {
            will_reconnect: *will_reconnect,
            reason: "dropped".into(),
        }),
        Step::ConnectFailed => {
            SessionEvent::Transport(TransportEvent::ConnectFailed { reason: "refused".into() })
        },
        Step::Snapshot(ids) => SessionEvent::Transport(TransportEvent::Received(
            ServerEvent::Messages(ids.iter().copied().map(message).collect()),
        )),
        Step::Push(id) => {
            SessionEvent::Transport(TransportEvent::Received(ServerEvent::Message(message(*id))))
        },
        Step::Roster(names) => SessionEvent::Transport(TransportEvent::Received(ServerEvent::Users(
            names.iter().map(|n| Participant::new(peer(*n))).collect(),
        ))),
        Step::PeerTyping(n, is_typing) => SessionEvent::Transport(TransportEvent::Received(
            ServerEvent::UserTyping { user: peer(*n), is_typing: *is_typing },
        )),
        Step::Keystroke { .. } => SessionEvent::Keystroke { now },
        Step::TimerFire { .. } => SessionEvent::TypingTimerElapsed { now },
        Step::Send(text) => SessionEvent::SendMessage { text: text.clone() },
    }
}

fn advance(step: &Step) -> Duration {
    match step {
        Step::Keystroke { after_ms } | Step::TimerFire { after_ms } => {
            Duration::from_millis(*after_ms)
        },
        _ => Duration::ZERO,
    }
}

proptest! {
    #[test]
    fn log_ids_stay_unique(steps in prop::collection::vec(step_strategy(), 0..60)) {
        let mut session: Session = Session::new(NAME, SessionConfig::default());
        session.handle(SessionEvent::Start);
        let mut now = Instant::now();

        for step in &steps {
            now += advance(step);
            session.handle(to_event(step, now));

            let mut seen = HashSet::new();
            for message in session.log().messages() {
                prop_assert!(seen.insert(message.id.clone()), "duplicate id {}", message.id);
            }
        }
    }

    #[test]
    fn roster_replaces_presence(steps in prop::collection::vec(step_strategy(), 0..60)) {
        let mut session: Session = Session::new(NAME, SessionConfig::default());
        session.handle(SessionEvent::Start);
        let mut now = Instant::now();

        for step in &steps {
            now += advance(step);
            let connected = session.status() == ConnectionStatus::Connected;
            session.handle(to_event(step, now));

            if let (Step::Roster(names), true) = (step, connected) {
                let expected: BTreeSet<String> = names.iter().map(|n| peer(*n)).collect();
                let actual: BTreeSet<String> = session.presence().names().map(str::to_owned).collect();
                prop_assert_eq!(actual, expected);
            }
        }
    }

    #[test]
    fn emits_only_while_connected(steps in prop::collection::vec(step_strategy(), 0..60)) {
        let mut session: Session = Session::new(NAME, SessionConfig::default());
        session.handle(SessionEvent::Start);
        let mut now = Instant::now();

        for step in &steps {
            now += advance(step);
            let was_connected = session.status() == ConnectionStatus::Connected;
            let actions = session.handle(to_event(step, now));

            for action in &actions {
                if let SessionAction::Emit(command) = action {
                    let is_join = matches!(command, ClientCommand::Join { full_name } if full_name == NAME);
                    prop_assert!(
                        was_connected || (matches!(step, Step::Connect) && is_join),
                        "emitted {:?} while {:?}", command, session.status()
                    );
                }
            }
        }
    }

    #[test]
    fn timer_armed_one_timeout_after_keystroke(
        steps in prop::collection::vec(step_strategy(), 0..60),
    ) {
        let config = SessionConfig::default();
        let idle = config.typing_idle_timeout;
        let mut session: Session = Session::new(NAME, config);
        session.handle(SessionEvent::Start);
        let mut now = Instant::now();

        for step in &steps {
            now += advance(step);
            let actions = session.handle(to_event(step, now));

            for action in &actions {
                if let SessionAction::ArmTypingTimer { deadline } = action {
                    prop_assert!(
                        matches!(step, Step::Keystroke { .. }),
                        "timer armed by {:?}", step
                    );
                    prop_assert_eq!(*deadline, now + idle);
                }
            }
        }
    }

    #[test]
    fn keystroke_burst_signals_once(gaps in prop::collection::vec(0u64..1000, 1..20)) {
        let config = SessionConfig::default();
        let idle = config.typing_idle_timeout;
        let mut session: Session = Session::new(NAME, config);
        session.handle(SessionEvent::Start);
        session.handle(SessionEvent::Transport(TransportEvent::Connected));
        let mut now = Instant::now();

        let mut emitted = Vec::new();
        for gap in &gaps {
            now += Duration::from_millis(*gap);
            emitted.extend(emits(session.handle(SessionEvent::Keystroke { now })));
        }
        prop_assert_eq!(emitted, vec![ClientCommand::Typing(true)]);

        let deadline = session.typing_deadline().unwrap();
        prop_assert_eq!(deadline, now + idle);

        let stopped = emits(session.handle(SessionEvent::TypingTimerElapsed { now: deadline }));
        prop_assert_eq!(stopped, vec![ClientCommand::Typing(false)]);
        prop_assert_eq!(session.typing_deadline(), None);
    }
}

fn emits(actions: Vec<SessionAction>) -> Vec<ClientCommand> {
    actions
        .into_iter()
        .filter_map(|action| match action {
            SessionAction::Emit(command) => Some(command),
            _ => None,
        })
        .collect()
}
