//! Connection supervisor for the client.
//!
//! Provides [`Transport`], which owns one background task that connects to
//! the server, forwards commands, decodes server events, and reconnects with
//! backoff when an established connection is lost. This is a thin layer that
//! just moves frames. Session logic stays in the Sans-IO [`crate::Session`].
//!
//! Transports are tried in [`TransportConfig::transports`] order on every
//! connect, all within one connect timeout: WebSocket first, then QUIC.
//!
//! The WebSocket transport speaks Socket.IO v5 and works against a stock
//! Socket.IO server. QUIC carries the bare event frames and needs a server
//! that also listens for the `palaver` ALPN on the same host and port.

mod backoff;
mod quic;
mod tls;
mod websocket;

use std::{
    fmt,
    str::FromStr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

pub use backoff::{DEFAULT_INITIAL_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY, ReconnectPolicy};
use palaver_proto::{ClientCommand, ProtocolError, codec};
use thiserror::Error;
use tokio::{
    sync::mpsc,
    task::AbortHandle,
    time::{Instant, timeout_at},
};
use tracing::{debug, info, warn};

use crate::TransportEvent;

/// Default time allowed for one connection attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// Default capacity of the command and event channels.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Transport errors.
///
/// These never escape [`Transport`]; they become the `reason` of a
/// [`TransportEvent`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// The endpoint could not be turned into a connection target.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Connection failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Connect attempt took too long.
    #[error("connect timed out after {0:?}")]
    Timeout(Duration),

    /// The server did not complete the Socket.IO session handshake.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// TLS configuration could not be built.
    #[error("tls error: {0}")]
    Tls(String),

    /// Stream error.
    #[error("stream error: {0}")]
    Stream(String),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Wire transport used for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// WebSocket text frames.
    WebSocket,
    /// Newline-delimited frames on one QUIC bidirectional stream.
    Quic,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WebSocket => f.write_str("websocket"),
            Self::Quic => f.write_str("quic"),
        }
    }
}

impl FromStr for TransportKind {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "websocket" | "ws" => Ok(Self::WebSocket),
            "quic" => Ok(Self::Quic),
            other => Err(TransportError::InvalidEndpoint(format!("unknown transport: {other}"))),
        }
    }
}

/// Transport configuration.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Time allowed for one connection attempt, shared by every transport
    /// tried during it.
    pub connect_timeout: Duration,
    /// Transports to try, in order.
    pub transports: Vec<TransportKind>,
    /// Reconnect behavior after an established connection is lost.
    pub reconnect: ReconnectPolicy,
    /// Capacity of the command and event channels.
    pub channel_capacity: usize,
    /// Skip server certificate verification. Development only.
    pub accept_invalid_certs: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            transports: vec![TransportKind::WebSocket, TransportKind::Quic],
            reconnect: ReconnectPolicy::default(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            accept_invalid_certs: false,
        }
    }
}

/// Handle to a supervised connection.
///
/// Commands are sent fire-and-forget with [`Transport::send`]; connection
/// changes and server events are read with [`Transport::recv`]. After
/// [`Transport::close`] (or drop) no further events are delivered.
#[derive(Debug)]
pub struct Transport {
    commands: mpsc::Sender<ClientCommand>,
    events: mpsc::Receiver<TransportEvent>,
    connected: Arc<AtomicBool>,
    task: AbortHandle,
    closed: bool,
}

impl Transport {
    /// Start connecting to `endpoint` in the background.
    ///
    /// Never blocks and never fails directly: an unusable endpoint or an
    /// unreachable server surfaces as [`TransportEvent::ConnectFailed`].
    /// Must be called from within a tokio runtime.
    pub fn open(endpoint: &str, config: TransportConfig) -> Self {
        let capacity = config.channel_capacity.max(1);
        let (command_tx, command_rx) = mpsc::channel(capacity);
        let (event_tx, event_rx) = mpsc::channel(capacity);
        let connected = Arc::new(AtomicBool::new(false));

        let supervisor = Supervisor {
            endpoint: endpoint.to_owned(),
            config,
            commands: command_rx,
            events: event_tx,
            connected: Arc::clone(&connected),
        };
        let handle = tokio::spawn(supervisor.run());

        Self {
            commands: command_tx,
            events: event_rx,
            connected,
            task: handle.abort_handle(),
            closed: false,
        }
    }

    /// Queue a command for the current connection.
    ///
    /// Commands are never buffered across connections: while disconnected
    /// the command is dropped with a warning.
    pub fn send(&self, command: ClientCommand) {
        if self.closed || !self.is_connected() {
            warn!(event = command.event_name(), "not connected, dropping command");
            return;
        }

        if let Err(e) = self.commands.try_send(command) {
            warn!(error = %e, "command channel unavailable, dropping command");
        }
    }

    /// Whether a connection is currently established.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Next transport event, or `None` once closed or the supervisor has
    /// finished.
    pub async fn recv(&mut self) -> Option<TransportEvent> {
        if self.closed {
            return None;
        }
        self.events.recv().await
    }

    /// Stop the connection. Idempotent.
    ///
    /// Pending events are discarded so none are observed after this
    /// returns.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.task.abort();
        self.connected.store(false, Ordering::Release);
        self.events.close();
        while self.events.try_recv().is_ok() {}
        debug!("transport closed");
    }

    /// Whether [`Transport::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.close();
    }
}

/// How a connection ended.
enum LinkEnd {
    /// The connection broke.
    Lost(String),
    /// The handle went away; stop supervising.
    Closed,
}

/// An established connection.
enum Link {
    WebSocket(Box<websocket::WsLink>),
    Quic(quic::QuicLink),
}

impl Link {
    async fn run(
        self,
        commands: &mut mpsc::Receiver<ClientCommand>,
        events: &mpsc::Sender<TransportEvent>,
    ) -> LinkEnd {
        match self {
            Self::WebSocket(link) => websocket::run(*link, commands, events).await,
            Self::Quic(link) => quic::run(link, commands, events).await,
        }
    }
}

/// Background task state.
struct Supervisor {
    endpoint: String,
    config: TransportConfig,
    commands: mpsc::Receiver<ClientCommand>,
    events: mpsc::Sender<TransportEvent>,
    connected: Arc<AtomicBool>,
}

impl Supervisor {
    async fn run(mut self) {
        let mut established = false;
        let mut attempt: u32 = 0;

        loop {
            match self.establish().await {
                Ok(link) => {
                    established = true;

                    // Anything queued belongs to a previous connection.
                    while self.commands.try_recv().is_ok() {}
                    self.connected.store(true, Ordering::Release);
                    if self.events.send(TransportEvent::Connected).await.is_err() {
                        return;
                    }

                    let end = link.run(&mut self.commands, &self.events).await;
                    self.connected.store(false, Ordering::Release);

                    let reason = match end {
                        LinkEnd::Lost(reason) => reason,
                        LinkEnd::Closed => return,
                    };

                    let will_reconnect = self.config.reconnect.is_enabled();
                    info!(%reason, will_reconnect, "connection lost");
                    let event = TransportEvent::Disconnected { will_reconnect, reason };
                    if self.events.send(event).await.is_err() || !will_reconnect {
                        return;
                    }
                    attempt = 1;
                },
                Err(e) if !established => {
                    warn!(error = %e, endpoint = %self.endpoint, "connect failed");
                    let _ = self
                        .events
                        .send(TransportEvent::ConnectFailed { reason: e.to_string() })
                        .await;
                    return;
                },
                Err(e) => {
                    warn!(error = %e, attempt, "reconnect attempt failed");
                    attempt = attempt.saturating_add(1);
                    if !self.config.reconnect.allows(attempt) {
                        let reason = format!("gave up reconnecting: {e}");
                        let _ = self.events.send(TransportEvent::ConnectFailed { reason }).await;
                        return;
                    }
                },
            }

            let delay = self.config.reconnect.delay(attempt);
            debug!(attempt, ?delay, "waiting before reconnect");
            tokio::time::sleep(delay).await;
        }
    }

    /// Try each configured transport in order until one connects or the
    /// connect timeout runs out.
    async fn establish(&self) -> Result<Link, TransportError> {
        let deadline = Instant::now() + self.config.connect_timeout;
        let mut last_error = TransportError::Connection("no transports configured".into());

        for &kind in &self.config.transports {
            if Instant::now() >= deadline {
                break;
            }

            let attempt = async {
                match kind {
                    TransportKind::WebSocket => {
                        websocket::connect(&self.endpoint, self.config.accept_invalid_certs)
                            .await
                            .map(|link| Link::WebSocket(Box::new(link)))
                    },
                    TransportKind::Quic => {
                        quic::connect(&self.endpoint, self.config.accept_invalid_certs)
                            .await
                            .map(Link::Quic)
                    },
                }
            };

            match timeout_at(deadline, attempt).await {
                Ok(Ok(link)) => {
                    info!(transport = %kind, endpoint = %self.endpoint, "connected");
                    return Ok(link);
                },
                Ok(Err(e)) => {
                    debug!(transport = %kind, error = %e, "transport unavailable");
                    last_error = e;
                },
                Err(_) => {
                    debug!(transport = %kind, "connect timed out");
                    last_error = TransportError::Timeout(self.config.connect_timeout);
                },
            }
        }

        Err(last_error)
    }
}

/// Decode one inbound frame and forward it.
///
/// Returns `false` once the event receiver is gone. Undecodable frames are
/// logged and skipped.
async fn deliver(events: &mpsc::Sender<TransportEvent>, text: &str) -> bool {
    match codec::decode_event(text) {
        Ok(event) => events.send(TransportEvent::Received(event)).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "dropping undecodable frame");
            true
        },
    }
}
