//! `titlecast` — Terminal front-end for retitling live broadcasts through a
//! Streamer.bot WebSocket server.
//!
//! Built on [ratatui](https://ratatui.rs) with reactive data from
//! `titlecast-core`'s [`Session`](titlecast_core::Session). One screen: the
//! live broadcast table, with overlays for retitling a single broadcast or
//! all of them at once.
//!
//! Logs are written to a file (default `/tmp/titlecast.log`) to avoid
//! corrupting the terminal UI. A background data bridge task continuously
//! streams session events into the TUI action loop.
//!
//! Entry point: CLI argument parsing, tracing setup, panic hooks, and app launch.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use titlecast_core::{RequiredActionSet, Session};

use crate::app::App;

/// Terminal UI for retitling Twitch and YouTube broadcasts.
#[derive(Parser, Debug)]
#[command(name = "titlecast", version, about)]
struct Cli {
    /// Automation server host (e.g. 127.0.0.1)
    #[arg(short = 's', long, env = "TITLECAST_SERVER")]
    server: Option<String>,

    /// Automation server WebSocket port
    #[arg(short = 'p', long, env = "TITLECAST_PORT")]
    port: Option<u16>,

    /// Required-actions manifest: a local path or an http(s):// URL
    #[arg(short = 'm', long, env = "TITLECAST_MANIFEST")]
    manifest: Option<String>,

    /// Log file path (defaults to /tmp/titlecast.log)
    #[arg(long, default_value = "/tmp/titlecast.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Write a default config file to the platform config directory and exit
    #[arg(long)]
    init_config: bool,
}

/// Set up file-based tracing. We MUST NOT log to stdout/stderr — that would
/// corrupt the TUI output. Returns a guard that must be held for the
/// lifetime of the application to ensure logs are flushed.
fn setup_tracing(cli: &Cli, fallback_level: &str) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => fallback_level,
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_env("TITLECAST_LOG").unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "titlecast={log_level},titlecast_core={log_level},titlecast_api={log_level}"
        ))
    });

    let log_dir = cli
        .log_file
        .parent()
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("titlecast.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Install panic/error hooks BEFORE entering the terminal
    tui::install_hooks()?;

    if cli.init_config {
        let path = titlecast_config::write_default_config()?;
        println!("wrote {}", path.display());
        return Ok(());
    }

    // Config file + environment first, CLI flags on top
    let mut config = titlecast_config::load_config_or_default();
    if let Some(server) = cli.server.clone() {
        config.server = server;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(manifest) = cli.manifest.clone() {
        config.manifest = manifest;
    }
    config.validate()?;

    // Tracing to file — hold the guard so logs flush on exit
    let _log_guard = setup_tracing(&cli, &config.log_level);

    info!(
        server = %config.server,
        port = config.port,
        "starting titlecast"
    );

    // An unloadable manifest is not fatal here: the session reports it as a
    // permanently failed capability check and the setup panel explains it.
    let required = match RequiredActionSet::load(&config.manifest).await {
        Ok(set) => Some(set),
        Err(e) => {
            warn!(
                error = %e,
                manifest = %config.manifest,
                "required-actions manifest unavailable"
            );
            None
        }
    };

    let cancel = CancellationToken::new();
    let session = Session::connect(config.session_config(), required, cancel.child_token())?;

    let endpoint = format!("ws://{}:{}", config.server, config.port);
    let mut app = App::new(session, endpoint, config.docs_url.clone());
    app.run().await?;

    cancel.cancel();
    Ok(())
}
