//! Kazhutha host server.
//!
//! Spawns one authoritative table actor and serves it over HTTP and
//! WebSocket until interrupted.

use anyhow::{Context, Error};
use kazhutha::TableActor;
use kz_server::{
    api,
    config::{Overrides, ServerConfig},
    logging,
};
use log::info;
use pico_args::Arguments;

const HELP: &str = "\
Host a Kazhutha table

USAGE:
  kz_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env KZ_BIND or 127.0.0.1:6969]
  --name       NAME        Table name                  [default: env KZ_TABLE_NAME or Kazhutha]
  --bots       N           Bot seats added at start    [default: env KZ_BOT_SEATS or 0]
  --pause-ms   MS          Trick pause in milliseconds [default: env KZ_TRICK_PAUSE_MS or 3000]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  KZ_BIND                  Server bind address (e.g., 0.0.0.0:6969)
  KZ_TABLE_NAME            Table name
  KZ_MAX_SEATS             Seats for humans and bots combined (2 to 8)
  KZ_BOT_SEATS             Bot seats added after the humans
  KZ_TRICK_PAUSE_MS        How long a finished trick stays on the table
  KZ_BOT_THINK_MS          Delay before a bot plays
  RUST_LOG                 Log filter (e.g., info,kazhutha=debug)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = Overrides {
        bind: pargs.opt_value_from_str("--bind")?,
        table_name: pargs.opt_value_from_str("--name")?,
        bot_seats: pargs.opt_value_from_str("--bots")?,
        trick_pause_ms: pargs.opt_value_from_str("--pause-ms")?,
    };

    logging::init();

    let config = ServerConfig::from_env(overrides)?;
    config.validate()?;

    info!(
        "Starting table '{}' with {} seats ({} bots) at {}",
        config.table.name, config.table.max_seats, config.table.bot_seats, config.bind
    );

    let table = TableActor::spawn(config.table.clone());
    let app = api::create_router(api::AppState {
        table: table.clone(),
    });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");
    if table.close().await.is_err() {
        info!("Table had already stopped");
    }

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
}
