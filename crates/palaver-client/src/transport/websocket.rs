//! WebSocket transport speaking Socket.IO v5 over Engine.IO v4.
//!
//! After the upgrade the server opens the Engine.IO session, the client joins
//! the default namespace, and from then on every chat event is a `42` packet.
//! Server pings are answered with pongs; a server that stays silent for a
//! full ping interval plus ping timeout is treated as gone.

use std::{fmt, sync::Arc, time::Duration};

use futures::{Sink, SinkExt, StreamExt};
use palaver_proto::{
    ClientCommand, Handshake, Packet, codec,
    packet::{ENGINE_IO_VERSION, SOCKET_IO_PATH},
};
use tokio::{
    net::TcpStream,
    sync::mpsc,
    time::{Instant, sleep},
};
use tokio_tungstenite::{
    Connector, MaybeTlsStream, WebSocketStream, connect_async_tls_with_config,
    tungstenite::Message as WsMessage,
};
use tracing::{debug, trace, warn};
use url::Url;

use super::{LinkEnd, TransportError, deliver, tls};
use crate::TransportEvent;

pub(super) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// An upgraded WebSocket with a connected Socket.IO session.
pub(super) struct WsLink {
    stream: WsStream,
    liveness: Duration,
}

/// Resolve an endpoint to the Socket.IO WebSocket URL.
///
/// `http` maps to `ws` and `https` to `wss`. The request goes to
/// `/socket.io/?EIO=4&transport=websocket`; any other path would name a
/// namespace, and only the default namespace is used.
pub(super) fn websocket_url(endpoint: &str) -> Result<Url, TransportError> {
    let mut url =
        Url::parse(endpoint).map_err(|e| TransportError::InvalidEndpoint(format!("{endpoint}: {e}")))?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(TransportError::InvalidEndpoint(format!("unsupported scheme: {other}")));
        },
    };

    url.set_scheme(scheme)
        .map_err(|()| TransportError::InvalidEndpoint(format!("cannot use {scheme} for {endpoint}")))?;

    let path = url.path().to_owned();
    match path.as_str() {
        "" | "/" | SOCKET_IO_PATH => url.set_path(SOCKET_IO_PATH),
        other => {
            return Err(TransportError::InvalidEndpoint(format!(
                "{endpoint}: namespace {other} is not supported"
            )));
        },
    }
    url.set_query(Some(&format!("EIO={ENGINE_IO_VERSION}&transport=websocket")));
    Ok(url)
}

pub(super) async fn connect(
    endpoint: &str,
    accept_invalid_certs: bool,
) -> Result<WsLink, TransportError> {
    let url = websocket_url(endpoint)?;
    let tls = tls::client_config(&[b"http/1.1"], accept_invalid_certs)?;

    let (mut stream, response) = connect_async_tls_with_config(
        url.as_str(),
        None,
        true,
        Some(Connector::Rustls(Arc::new(tls))),
    )
    .await
    .map_err(|e| TransportError::Connection(format!("websocket {url}: {e}")))?;
    debug!(%url, status = %response.status(), "websocket upgraded");

    let handshake = open_session(&mut stream).await?;
    debug!(
        sid = %handshake.sid,
        ping_interval_ms = handshake.ping_interval,
        ping_timeout_ms = handshake.ping_timeout,
        "socket.io session connected"
    );

    Ok(WsLink { stream, liveness: handshake.liveness_window() })
}

/// Wait for the Engine.IO open, then connect to the default namespace.
async fn open_session(stream: &mut WsStream) -> Result<Handshake, TransportError> {
    let handshake = match next_packet(stream).await? {
        Packet::Open(handshake) => handshake,
        other => {
            return Err(TransportError::Handshake(format!("expected open packet, got {other:?}")));
        },
    };

    send_packet(stream, &Packet::Connect).await?;

    loop {
        match next_packet(stream).await? {
            Packet::Connect => return Ok(handshake),
            Packet::Ping => send_packet(stream, &Packet::Pong).await?,
            Packet::ConnectError(message) => {
                return Err(TransportError::Handshake(format!("connect refused: {message}")));
            },
            Packet::Close | Packet::Disconnect => {
                return Err(TransportError::Handshake("server closed the session".into()));
            },
            other => trace!(?other, "ignoring packet before connect"),
        }
    }
}

async fn next_packet(stream: &mut WsStream) -> Result<Packet, TransportError> {
    loop {
        match stream.next().await {
            Some(Ok(WsMessage::Text(text))) => return Ok(Packet::decode(&text)?),
            Some(Ok(WsMessage::Close(_))) | None => {
                return Err(TransportError::Handshake("connection closed during handshake".into()));
            },
            Some(Ok(_)) => {},
            Some(Err(e)) => return Err(TransportError::Stream(e.to_string())),
        }
    }
}

async fn send_packet<S>(sink: &mut S, packet: &Packet) -> Result<(), TransportError>
where
    S: Sink<WsMessage> + Unpin,
    S::Error: fmt::Display,
{
    let text = packet.encode()?;
    sink.send(WsMessage::Text(text))
        .await
        .map_err(|e| TransportError::Stream(format!("send failed: {e}")))
}

pub(super) async fn run(
    link: WsLink,
    commands: &mut mpsc::Receiver<ClientCommand>,
    events: &mpsc::Sender<TransportEvent>,
) -> LinkEnd {
    let WsLink { stream, liveness } = link;
    let (mut sink, mut source) = stream.split();
    let silence = sleep(liveness);
    tokio::pin!(silence);

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    let _ = send_packet(&mut sink, &Packet::Disconnect).await;
                    let _ = sink.close().await;
                    return LinkEnd::Closed;
                };
                match codec::encode_command(&command) {
                    Ok(frame) => {
                        if let Err(e) = send_packet(&mut sink, &Packet::Event(frame)).await {
                            return LinkEnd::Lost(e.to_string());
                        }
                    },
                    Err(e) => warn!(error = %e, "failed to encode command"),
                }
            }
            frame = source.next() => {
                silence.as_mut().reset(Instant::now() + liveness);
                match frame {
                    Some(Ok(WsMessage::Text(text))) => match Packet::decode(&text) {
                        Ok(Packet::Event(frame)) => {
                            if !deliver(events, &frame).await {
                                return LinkEnd::Closed;
                            }
                        },
                        Ok(Packet::Ping) => {
                            if let Err(e) = send_packet(&mut sink, &Packet::Pong).await {
                                return LinkEnd::Lost(e.to_string());
                            }
                        },
                        Ok(Packet::Disconnect) => {
                            return LinkEnd::Lost("server ended the session".to_owned());
                        },
                        Ok(Packet::Close) => {
                            return LinkEnd::Lost("server closed the session".to_owned());
                        },
                        Ok(other) => trace!(?other, "ignoring packet"),
                        Err(e) => warn!(error = %e, "dropping undecodable packet"),
                    },
                    Some(Ok(WsMessage::Close(frame))) => {
                        let reason = frame.map_or_else(
                            || "server closed connection".to_owned(),
                            |f| format!("server closed connection: {}", f.reason),
                        );
                        return LinkEnd::Lost(reason);
                    },
                    Some(Ok(WsMessage::Binary(_))) => debug!("ignoring binary frame"),
                    Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => {},
                    Some(Err(e)) => return LinkEnd::Lost(e.to_string()),
                    None => return LinkEnd::Lost("connection closed".to_owned()),
                }
            }
            () = &mut silence => {
                return LinkEnd::Lost(format!("no ping from server within {liveness:?}"));
            }
        }
    }
}
