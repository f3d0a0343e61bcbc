//! Palaver TUI entry point.

use std::{fs::File, path::PathBuf, sync::Mutex, time::Duration};

use clap::Parser;
use palaver_client::{
    SessionConfig,
    transport::{ReconnectPolicy, TransportConfig, TransportKind},
};
use palaver_tui::{DisplayName, Exit, Runtime, TerminalDriver};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Palaver terminal chat client
#[derive(Parser, Debug)]
#[command(name = "palaver")]
#[command(about = "Terminal client for Palaver group chat")]
#[command(version)]
struct Args {
    /// Server endpoint (http, https, ws, or wss URL)
    #[arg(short, long, default_value = "http://localhost:3001")]
    endpoint: String,

    /// Display name shown to other participants
    #[arg(short, long)]
    name: DisplayName,

    /// Time allowed for each connection attempt, in milliseconds
    #[arg(long, default_value_t = 20_000)]
    connect_timeout_ms: u64,

    /// Transports to try, in order (websocket, quic)
    #[arg(long = "transport", value_delimiter = ',', default_value = "websocket,quic")]
    transports: Vec<TransportKind>,

    /// Inactivity before the typing indicator is cleared, in milliseconds
    #[arg(long, default_value_t = 1_000)]
    typing_timeout_ms: u64,

    /// Do not reconnect after the connection is lost
    #[arg(long)]
    no_reconnect: bool,

    /// Skip server certificate verification (development only)
    #[arg(long)]
    insecure: bool,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write logs to this file (the terminal is owned by the UI)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(&args)?;

    let transport = TransportConfig {
        connect_timeout: Duration::from_millis(args.connect_timeout_ms),
        transports: args.transports,
        reconnect: if args.no_reconnect {
            ReconnectPolicy::disabled()
        } else {
            ReconnectPolicy::default()
        },
        accept_invalid_certs: args.insecure,
        ..TransportConfig::default()
    };
    let session = SessionConfig {
        typing_idle_timeout: Duration::from_millis(args.typing_timeout_ms),
        ..SessionConfig::default()
    };

    tracing::info!(endpoint = %args.endpoint, name = %args.name, "Palaver client starting");

    let driver = TerminalDriver::new(args.endpoint.clone(), transport)?;
    let mut runtime = Runtime::new(driver, args.name.into_inner(), session);
    let exit = runtime.run().await;

    // Restore the terminal before reporting anything.
    drop(runtime);

    match exit? {
        Exit::Left | Exit::InputClosed => Ok(()),
        Exit::Failed { reason } => {
            Err(format!("could not connect to {}: {reason}", args.endpoint).into())
        },
    }
}

/// Install the tracing subscriber.
///
/// Logs only go to `--log-file`; without one, nothing is written so the UI
/// is not disturbed.
fn init_tracing(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = &args.log_file else {
        return Ok(());
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let file = File::create(path)?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(filter)
        .init();
    Ok(())
}
