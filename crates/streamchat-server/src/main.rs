//! streamchat: a browser chat front end for a streaming chat-completion API.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use streamchat_common::{ConfigError, Result, StreamchatError};
use streamchat_config::{SecretStore, StreamchatConfig};
use streamchat_server::{initialize, serve, spawn_reaper};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "streamchat", version, about = "Streamed chat with an OpenAI-compatible model")]
struct Args {
    /// Config file path override.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Secrets file path override.
    #[arg(long)]
    secrets: Option<PathBuf>,

    /// Address to bind, overriding `server.bind_address`.
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on, overriding `server.port`.
    #[arg(short, long)]
    port: Option<u16>,

    /// Log filter directive (e.g. `streamchat=debug`).
    #[arg(long)]
    log_level: Option<String>,
}

/// Load environment variables from a .env file (KEY=VALUE lines).
/// Variables already set in the environment win.
fn load_dotenv() {
    let Ok(contents) = std::fs::read_to_string(".env") else {
        return;
    };
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if std::env::var_os(key).is_none() {
                std::env::set_var(key, value);
            }
        }
    }
}

fn init_tracing(args: &Args, config: &StreamchatConfig) {
    let filter = match &args.log_level {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("streamchat={}", config.logging.level.as_filter()))),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// An explicit `--config` must load and validate. The default file falls
/// back to built-in defaults, returning the reason for a later warning.
fn load_config(args: &Args) -> std::result::Result<(StreamchatConfig, Option<ConfigError>), ConfigError> {
    match &args.config {
        Some(path) => streamchat_config::load_config(Some(path)).map(|c| (c, None)),
        None => Ok(match streamchat_config::load_config(None) {
            Ok(config) => (config, None),
            Err(e) => (StreamchatConfig::default(), Some(e)),
        }),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file before anything else
    load_dotenv();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("streamchat: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let (mut config, fallback) = load_config(&args)?;

    init_tracing(&args, &config);
    tracing::info!("streamchat v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Some(e) = fallback {
        tracing::warn!("Config load failed, using defaults: {e}");
    }

    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let secrets = SecretStore::discover(args.secrets.as_deref())?;

    let addr = config.server.listen_addr();
    let ttl = Duration::from_secs(config.server.session_ttl_secs);
    let state = initialize(config, &secrets)?;

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| StreamchatError::Server(format!("failed to bind {addr}: {e}")))?;
    tracing::info!("streamchat listening on http://{addr}");

    spawn_reaper(state.store.clone(), ttl);
    serve(listener, state).await?;
    Ok(())
}
