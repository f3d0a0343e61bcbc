//! QUIC transport: newline-delimited event frames on one bidirectional
//! stream.
//!
//! This is not part of Socket.IO. Frames are the bare `[name, payload]`
//! arrays without the Engine.IO envelope, and liveness comes from QUIC
//! keep-alives instead of pings.

use std::{
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
    sync::Arc,
    time::Duration,
};

use palaver_proto::{ClientCommand, codec};
use quinn::{ClientConfig, Connection, Endpoint, RecvStream, SendStream, VarInt};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{debug, warn};
use url::Url;

use super::{LinkEnd, TransportError, deliver, tls};
use crate::TransportEvent;

/// ALPN protocol the server must accept.
const ALPN: &[u8] = b"palaver";

const MAX_IDLE_TIMEOUT: Duration = Duration::from_secs(30);
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(10);

/// An established QUIC connection with its command stream.
pub(super) struct QuicLink {
    connection: Connection,
    send: SendStream,
    recv: RecvStream,
    // Keeps the socket alive for the connection's lifetime.
    _endpoint: Endpoint,
}

pub(super) async fn connect(
    endpoint: &str,
    accept_invalid_certs: bool,
) -> Result<QuicLink, TransportError> {
    let url =
        Url::parse(endpoint).map_err(|e| TransportError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
    let host = url
        .host_str()
        .ok_or_else(|| TransportError::InvalidEndpoint(format!("{endpoint}: missing host")))?
        .to_owned();
    let port = url
        .port_or_known_default()
        .ok_or_else(|| TransportError::InvalidEndpoint(format!("{endpoint}: missing port")))?;

    let addr = tokio::net::lookup_host((host.as_str(), port))
        .await
        .map_err(|e| TransportError::Connection(format!("resolve {host}: {e}")))?
        .next()
        .ok_or_else(|| TransportError::Connection(format!("no addresses for {host}")))?;

    let bind: SocketAddr = if addr.is_ipv6() {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    };
    let mut quic = Endpoint::client(bind)
        .map_err(|e| TransportError::Connection(format!("endpoint creation failed: {e}")))?;
    quic.set_default_client_config(client_config(accept_invalid_certs)?);

    let connection = quic
        .connect(addr, &host)
        .map_err(|e| TransportError::Connection(format!("connect failed: {e}")))?
        .await
        .map_err(|e| TransportError::Connection(format!("quic {addr}: {e}")))?;

    let (send, recv) = connection
        .open_bi()
        .await
        .map_err(|e| TransportError::Stream(format!("open stream failed: {e}")))?;

    debug!(%addr, "quic stream open");
    Ok(QuicLink { connection, send, recv, _endpoint: quic })
}

pub(super) async fn run(
    link: QuicLink,
    commands: &mut mpsc::Receiver<ClientCommand>,
    events: &mpsc::Sender<TransportEvent>,
) -> LinkEnd {
    let QuicLink { connection, mut send, recv, _endpoint } = link;
    let mut lines = BufReader::new(recv).lines();

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    connection.close(VarInt::from_u32(0), b"client closed");
                    return LinkEnd::Closed;
                };
                match codec::encode_command(&command) {
                    Ok(mut text) => {
                        text.push('\n');
                        if let Err(e) = send.write_all(text.as_bytes()).await {
                            return LinkEnd::Lost(format!("write failed: {e}"));
                        }
                    },
                    Err(e) => warn!(error = %e, "failed to encode command"),
                }
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) if line.trim().is_empty() => {},
                Ok(Some(line)) => {
                    if !deliver(events, &line).await {
                        return LinkEnd::Closed;
                    }
                },
                Ok(None) => return LinkEnd::Lost("server closed stream".to_owned()),
                Err(e) => return LinkEnd::Lost(format!("read failed: {e}")),
            },
            reason = connection.closed() => return LinkEnd::Lost(reason.to_string()),
        }
    }
}

fn client_config(accept_invalid_certs: bool) -> Result<ClientConfig, TransportError> {
    let crypto = tls::client_config(&[ALPN], accept_invalid_certs)?;
    let crypto = quinn::crypto::rustls::QuicClientConfig::try_from(crypto)
        .map_err(|e| TransportError::Tls(e.to_string()))?;

    let mut config = ClientConfig::new(Arc::new(crypto));

    let mut transport = quinn::TransportConfig::default();
    let idle = MAX_IDLE_TIMEOUT.try_into().map_err(|e| TransportError::Tls(format!("{e}")))?;
    transport.max_idle_timeout(Some(idle));
    transport.keep_alive_interval(Some(KEEP_ALIVE_INTERVAL));
    config.transport_config(Arc::new(transport));

    Ok(config)
}
