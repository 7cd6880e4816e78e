//! Structured logging configuration.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging.
///
/// Levels come from `RUST_LOG` and default to `info`. Records emitted
/// through the `log` facade by the game library are captured as well.
///
/// # Example
///
/// ```no_run
/// use kz_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,tungstenite=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a peer connection event with structured fields.
pub fn log_connection(event: &str, peer_id: &str, detail: Option<&str>) {
    tracing::info!(event = event, peer_id = peer_id, detail = detail, "CONNECTION: {}", event);
}

/// Log a frame the server refused to process.
pub fn log_rejected_frame(peer_id: &str, reason: &str) {
    tracing::warn!(peer_id = peer_id, reason = reason, "Rejected frame");
}
