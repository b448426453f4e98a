use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use dtail::{Coordinator, Diagnostics, LineSink};
use dtail_core::config::Config;
use dtail_core::{ColorMode, LineFormatter, Painter, StreamOptions};
use dtail_feeds::DockerClient;

#[derive(Parser)]
#[command(name = "dtail", about = "Tail logs from several containers at once")]
struct Cli {
    /// Container IDs or names to tail.
    containers: Vec<String>,

    /// Keep streaming new log lines as they are written.
    #[arg(short = 'f')]
    follow: bool,

    /// Show only the last N lines of each container's history (0 = all).
    #[arg(short = 'n', value_name = "N", default_value_t = 0)]
    lines: usize,

    /// When to colour output: auto, always or never.
    #[arg(long, value_name = "WHEN")]
    color: Option<ColorMode>,

    /// Read configuration from this file instead of ~/.config/dtail/config.toml.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write debug logs to /tmp/dtail-debug.log (tail -f to inspect).
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug)?;

    let mut config = Config::load(cli.config.as_deref())?;
    if let Ok(host) = std::env::var("DOCKER_HOST") {
        config.docker.host = host;
    }
    if let Some(color) = cli.color {
        config.output.color = color;
    }

    let client = DockerClient::from_host(&config.docker.host)?;
    tracing::debug!(endpoint = %client.endpoint(), "using docker engine");

    let opts = StreamOptions {
        follow: cli.follow,
        tail: cli.lines,
    };
    let formatter = LineFormatter::new(
        Painter::new(config.output.color),
        config.output.timestamp_format.clone(),
    );
    let coordinator = Coordinator::new(
        Arc::new(client),
        opts,
        formatter,
        LineSink::stdout(),
        Diagnostics::stderr(),
    )
    .with_drain_timeout(config.shutdown.drain_timeout());

    let code = coordinator.run(&cli.containers, shutdown_signal()).await;
    // Readers detached after the drain bound may still hold a worker thread;
    // exiting here keeps runtime teardown from waiting on them.
    std::process::exit(code)
}

fn init_tracing(debug: bool) -> anyhow::Result<()> {
    if debug {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open("/tmp/dtail-debug.log")?;
        tracing_subscriber::fmt()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .init();
        tracing::info!("dtail debug log started, tail -f /tmp/dtail-debug.log");
    } else if let Ok(filter) = tracing_subscriber::EnvFilter::try_from_env("RUST_LOG") {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    }
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
