//! Integration tests for the connection supervisor.
//!
//! Each test runs a loopback Socket.IO server on an ephemeral port: a
//! WebSocket that opens an Engine.IO session and accepts the default
//! namespace. Tests check the events the [`Transport`] reports and the
//! packets the server receives.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::{net::SocketAddr, time::Duration};

use futures::{SinkExt, StreamExt};
use palaver_client::{
    ClientCommand, Participant, ServerEvent, TransportEvent,
    transport::{ReconnectPolicy, Transport, TransportConfig, TransportKind},
};
use palaver_proto::{Handshake, Packet, codec};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{
    WebSocketStream, accept_async, accept_hdr_async,
    tungstenite::{
        Message as WsMessage,
        handshake::server::{ErrorResponse, Request, Response},
    },
};

type ServerWs = WebSocketStream<TcpStream>;

fn config(reconnect: ReconnectPolicy) -> TransportConfig {
    TransportConfig {
        connect_timeout: Duration::from_secs(2),
        transports: vec![TransportKind::WebSocket],
        reconnect,
        ..TransportConfig::default()
    }
}

fn handshake(ping_interval: u64, ping_timeout: u64) -> Handshake {
    Handshake {
        sid: "lv_VI97HAXpY6yYWAAAC".into(),
        upgrades: Vec::new(),
        ping_interval,
        ping_timeout,
        max_payload: 1_000_000,
    }
}

async fn next_event(transport: &mut Transport) -> Option<TransportEvent> {
    tokio::time::timeout(Duration::from_secs(5), transport.recv()).await.unwrap()
}

async fn listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

async fn send(ws: &mut ServerWs, packet: Packet) {
    ws.send(WsMessage::Text(packet.encode().unwrap())).await.unwrap();
}

async fn send_event(ws: &mut ServerWs, event: &ServerEvent) {
    send(ws, Packet::Event(codec::encode_event(event).unwrap())).await;
}

async fn recv(ws: &mut ServerWs) -> Packet {
    loop {
        if let WsMessage::Text(text) = ws.next().await.unwrap().unwrap() {
            return Packet::decode(&text).unwrap();
        }
    }
}

async fn recv_command(ws: &mut ServerWs) -> ClientCommand {
    match recv(ws).await {
        Packet::Event(frame) => codec::decode_command(&frame).unwrap(),
        other => panic!("expected event packet, got {other:?}"),
    }
}

/// Accept one client and complete the Socket.IO connect.
///
/// Returns the socket and the request URI the client upgraded on.
async fn accept_session(listener: &TcpListener, open: Handshake) -> (ServerWs, String) {
    let (tcp, _) = listener.accept().await.unwrap();
    let mut uri = String::new();
    let mut ws = accept_hdr_async(
        tcp,
        |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            uri = req.uri().to_string();
            Ok(resp)
        },
    )
    .await
    .unwrap();

    send(&mut ws, Packet::Open(open)).await;
    assert_eq!(recv(&mut ws).await, Packet::Connect);
    send(&mut ws, Packet::Connect).await;
    (ws, uri)
}

#[tokio::test]
async fn join_and_receive_roster() {
    let (listener, addr) = listener().await;

    let server = tokio::spawn(async move {
        let (mut ws, uri) = accept_session(&listener, handshake(25_000, 20_000)).await;
        let join = recv_command(&mut ws).await;
        send_event(&mut ws, &ServerEvent::Users(vec![Participant::new("Ada Lovelace")])).await;
        (uri, join)
    });

    let mut transport =
        Transport::open(&format!("http://{addr}"), config(ReconnectPolicy::disabled()));
    assert_eq!(next_event(&mut transport).await, Some(TransportEvent::Connected));
    assert!(transport.is_connected());

    transport.send(ClientCommand::Join { full_name: "Ada Lovelace".into() });

    assert_eq!(
        next_event(&mut transport).await,
        Some(TransportEvent::Received(ServerEvent::Users(vec![Participant::new("Ada Lovelace")])))
    );

    let (uri, join) = server.await.unwrap();
    assert_eq!(uri, "/socket.io/?EIO=4&transport=websocket");
    assert_eq!(join, ClientCommand::Join { full_name: "Ada Lovelace".into() });
}

#[tokio::test]
async fn answers_server_pings() {
    let (listener, addr) = listener().await;

    let server = tokio::spawn(async move {
        let (mut ws, _) = accept_session(&listener, handshake(25_000, 20_000)).await;
        send(&mut ws, Packet::Ping).await;
        let answer = recv(&mut ws).await;
        send_event(&mut ws, &ServerEvent::Users(Vec::new())).await;
        answer
    });

    let mut transport = Transport::open(&format!("ws://{addr}"), config(ReconnectPolicy::disabled()));
    assert_eq!(next_event(&mut transport).await, Some(TransportEvent::Connected));

    // Heartbeats are not surfaced; the next event is the roster.
    assert_eq!(
        next_event(&mut transport).await,
        Some(TransportEvent::Received(ServerEvent::Users(Vec::new())))
    );
    assert_eq!(server.await.unwrap(), Packet::Pong);
}

#[tokio::test]
async fn silent_server_is_dropped_after_liveness_window() {
    let (listener, addr) = listener().await;

    tokio::spawn(async move {
        let (mut ws, _) = accept_session(&listener, handshake(100, 100)).await;
        while let Some(Ok(_)) = ws.next().await {}
    });

    let mut transport = Transport::open(&format!("ws://{addr}"), config(ReconnectPolicy::disabled()));
    assert_eq!(next_event(&mut transport).await, Some(TransportEvent::Connected));

    match next_event(&mut transport).await {
        Some(TransportEvent::Disconnected { will_reconnect: false, reason }) => {
            assert!(reason.contains("no ping"), "{reason}");
        },
        other => panic!("expected disconnect, got {other:?}"),
    }
    assert_eq!(next_event(&mut transport).await, None);
}

#[tokio::test]
async fn refused_namespace_connect_is_a_connect_failure() {
    let (listener, addr) = listener().await;

    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(tcp).await.unwrap();
        send(&mut ws, Packet::Open(handshake(25_000, 20_000))).await;
        assert_eq!(recv(&mut ws).await, Packet::Connect);
        send(&mut ws, Packet::ConnectError("Room full".into())).await;
        while let Some(Ok(_)) = ws.next().await {}
    });

    let mut transport = Transport::open(&format!("ws://{addr}"), config(ReconnectPolicy::default()));

    match next_event(&mut transport).await {
        Some(TransportEvent::ConnectFailed { reason }) => {
            assert!(reason.contains("Room full"), "{reason}");
        },
        other => panic!("expected connect failure, got {other:?}"),
    }
    assert_eq!(next_event(&mut transport).await, None);
}

#[tokio::test]
async fn unreachable_server_fails_once() {
    let (listener, addr) = listener().await;
    drop(listener);

    let mut transport = Transport::open(&format!("ws://{addr}"), config(ReconnectPolicy::default()));

    assert!(matches!(next_event(&mut transport).await, Some(TransportEvent::ConnectFailed { .. })));
    assert_eq!(next_event(&mut transport).await, None);
    assert!(!transport.is_connected());
}

#[tokio::test]
async fn connect_timeout_covers_every_transport() {
    let (listener, addr) = listener().await;

    // Accepts TCP but never answers the upgrade; nothing listens for QUIC.
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((tcp, _)) = listener.accept().await {
            held.push(tcp);
        }
    });

    let config = TransportConfig {
        connect_timeout: Duration::from_millis(300),
        transports: vec![TransportKind::WebSocket, TransportKind::Quic],
        reconnect: ReconnectPolicy::disabled(),
        ..TransportConfig::default()
    };
    let started = std::time::Instant::now();
    let mut transport = Transport::open(&format!("http://{addr}"), config);

    match next_event(&mut transport).await {
        Some(TransportEvent::ConnectFailed { reason }) => {
            assert!(reason.contains("timed out"), "{reason}");
        },
        other => panic!("expected connect failure, got {other:?}"),
    }
    let elapsed = started.elapsed();
    assert!(elapsed < Duration::from_millis(550), "took {elapsed:?}");
}

#[tokio::test]
async fn invalid_endpoint_reports_connect_failed() {
    let mut transport = Transport::open("gopher://nowhere", config(ReconnectPolicy::default()));

    match next_event(&mut transport).await {
        Some(TransportEvent::ConnectFailed { reason }) => {
            assert!(reason.contains("unsupported scheme"), "{reason}");
        },
        other => panic!("expected connect failure, got {other:?}"),
    }
}

#[tokio::test]
async fn server_close_without_reconnect() {
    let (listener, addr) = listener().await;

    tokio::spawn(async move {
        let (mut ws, _) = accept_session(&listener, handshake(25_000, 20_000)).await;
        ws.close(None).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let mut transport = Transport::open(&format!("ws://{addr}"), config(ReconnectPolicy::disabled()));
    assert_eq!(next_event(&mut transport).await, Some(TransportEvent::Connected));

    assert!(matches!(
        next_event(&mut transport).await,
        Some(TransportEvent::Disconnected { will_reconnect: false, .. })
    ));
    assert_eq!(next_event(&mut transport).await, None);
}

#[tokio::test]
async fn server_disconnect_packet_ends_link() {
    let (listener, addr) = listener().await;

    tokio::spawn(async move {
        let (mut ws, _) = accept_session(&listener, handshake(25_000, 20_000)).await;
        send(&mut ws, Packet::Disconnect).await;
        while let Some(Ok(_)) = ws.next().await {}
    });

    let mut transport = Transport::open(&format!("ws://{addr}"), config(ReconnectPolicy::disabled()));
    assert_eq!(next_event(&mut transport).await, Some(TransportEvent::Connected));

    match next_event(&mut transport).await {
        Some(TransportEvent::Disconnected { will_reconnect: false, reason }) => {
            assert!(reason.contains("ended the session"), "{reason}");
        },
        other => panic!("expected disconnect, got {other:?}"),
    }
}

#[tokio::test]
async fn reconnects_without_replaying_dropped_commands() {
    let (listener, addr) = listener().await;

    let server = tokio::spawn(async move {
        let (mut ws, _) = accept_session(&listener, handshake(25_000, 20_000)).await;
        ws.close(None).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}

        let (mut ws, _) = accept_session(&listener, handshake(25_000, 20_000)).await;
        recv_command(&mut ws).await
    });

    let policy = ReconnectPolicy {
        max_attempts: 3,
        initial_delay: Duration::from_millis(200),
        max_delay: Duration::from_millis(400),
    };
    let mut transport = Transport::open(&format!("ws://{addr}"), config(policy));

    assert_eq!(next_event(&mut transport).await, Some(TransportEvent::Connected));
    assert!(matches!(
        next_event(&mut transport).await,
        Some(TransportEvent::Disconnected { will_reconnect: true, .. })
    ));

    // Not connected: dropped, never delivered on the next connection.
    transport.send(ClientCommand::Message { content: "lost".into() });

    assert_eq!(next_event(&mut transport).await, Some(TransportEvent::Connected));
    transport.send(ClientCommand::Typing(true));

    assert_eq!(server.await.unwrap(), ClientCommand::Typing(true));
}

#[tokio::test]
async fn close_stops_event_delivery() {
    let (listener, addr) = listener().await;

    tokio::spawn(async move {
        let (mut ws, _) = accept_session(&listener, handshake(25_000, 20_000)).await;
        let roster = Packet::Event(codec::encode_event(&ServerEvent::Users(Vec::new())).unwrap())
            .encode()
            .unwrap();
        loop {
            if ws.send(WsMessage::Text(roster.clone())).await.is_err() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    });

    let mut transport = Transport::open(&format!("ws://{addr}"), config(ReconnectPolicy::default()));
    assert_eq!(next_event(&mut transport).await, Some(TransportEvent::Connected));
    tokio::time::sleep(Duration::from_millis(50)).await;

    transport.close();
    transport.close();

    assert!(transport.is_closed());
    assert!(!transport.is_connected());
    assert_eq!(transport.recv().await, None);

    // Sending after close is a logged no-op.
    transport.send(ClientCommand::Typing(false));
}
