// dataprobe - load CSV datasets and run Lua analysis scripts over JSON-RPC

mod exit_codes;
mod server;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use dataprobe_config::{ConfigError, Settings, Transport};
use dataprobe_engine::SharedSession;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use exit_codes::{EXIT_CONFIG, EXIT_ERROR, EXIT_SUCCESS, EXIT_TRANSPORT};
use server::{stdio, tcp, Dispatcher};

#[derive(Parser)]
#[command(name = "dataprobe")]
#[command(about = "Session server for exploring CSV data with Lua scripts (JSON-RPC over stdio or TCP)")]
#[command(version, long_version = long_version())]
struct Cli {
    /// Config file (default: <config dir>/dataprobe/config.toml)
    #[arg(long, value_name = "PATH", env = "DATAPROBE_CONFIG")]
    config: Option<PathBuf>,

    /// stdio, tcp or both
    #[arg(long)]
    transport: Option<Transport>,

    /// TCP listen address
    #[arg(long)]
    host: Option<String>,

    /// TCP listen port
    #[arg(long)]
    port: Option<u16>,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nscripting: Lua 5.4",
        "\ntarget:    ", env!("TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut settings = Settings::load(cli.config.as_deref()).map_err(CliError::config)?;
    if let Some(transport) = cli.transport {
        settings.server.transport = transport;
    }
    if let Some(host) = cli.host {
        settings.server.host = host;
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }
    settings.validate().map_err(CliError::config)?;

    init_logging(settings.logging.filter.as_deref());

    let transport = settings.server.transport;
    log::info!("dataprobe {} starting ({} transport)", env!("CARGO_PKG_VERSION"), transport);

    let dispatcher = Dispatcher::new(SharedSession::new());

    let listener = if transport.uses_tcp() {
        let addr = settings.bind_addr();
        let listener = tcp::bind(&addr).map_err(|e| CliError {
            code: EXIT_TRANSPORT,
            message: format!("cannot listen on {}: {}", addr, e),
            hint: Some("pick a free port with --port".to_string()),
        })?;
        Some(tcp::spawn(listener, dispatcher.clone()))
    } else {
        None
    };

    // With both transports the process lives as long as stdin is open
    if transport.uses_stdio() {
        stdio::run(&dispatcher).map_err(|e| CliError::transport(format!("stdio: {}", e)))?;
        log::info!("stdin closed, shutting down");
    } else if let Some(handle) = listener {
        handle.join().map_err(|_| CliError::new(EXIT_ERROR, "TCP listener thread panicked"))?;
    }

    Ok(())
}

/// `RUST_LOG` wins, then the config filter, then `info`. Output goes to
/// stderr so stdout carries only protocol messages.
fn init_logging(config_filter: Option<&str>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config_filter.unwrap_or("info")));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn config(err: ConfigError) -> Self {
        let hint = match &err {
            ConfigError::NotFound(_) => Some("omit --config to use the default location".to_string()),
            ConfigError::Parse(_) | ConfigError::Validation(_) => {
                Some("see [server] transport/host/port and [logging] filter".to_string())
            }
            ConfigError::Read { .. } => None,
        };
        Self { code: EXIT_CONFIG, message: err.to_string(), hint }
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::new(EXIT_TRANSPORT, msg)
    }
}
