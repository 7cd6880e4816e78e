//! HTTP/WebSocket API for the Kazhutha host.
//!
//! # Endpoints
//!
//! - `GET /health` - Server health status
//! - `GET /api/table` - Table settings, roster and public snapshot
//! - `GET /ws` - WebSocket for participants; the first frame must be
//!   `request_join`
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use kazhutha::{TableActor, TableConfig};
//! use kz_server::api::{AppState, create_router};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let table = TableActor::spawn(TableConfig::default());
//! let app = create_router(AppState { table });
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:6969").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod tables;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use kazhutha::TableHandle;
use serde_json::json;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers and WebSocket connections.
#[derive(Clone)]
pub struct AppState {
    pub table: TableHandle,
}

/// Create the API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/table", get(tables::get_table))
        .route("/ws", get(websocket::websocket_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring.
///
/// Returns `200 OK` while the table actor is running, `503 Service
/// Unavailable` once it has stopped.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let table_healthy = !state.table.is_closed();

    let status_code = if table_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if table_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "table": table_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
