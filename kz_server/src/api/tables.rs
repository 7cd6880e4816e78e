//! Table inspection handler.
//!
//! ```bash
//! curl http://localhost:6969/api/table
//! ```

use axum::{Json, extract::State, http::StatusCode};
use kazhutha::table::TableStateResponse;
use log::error;

use super::AppState;

/// Get the table settings, the lobby roster and the public snapshot.
///
/// Hands never appear in this response.
pub async fn get_table(
    State(state): State<AppState>,
) -> Result<Json<TableStateResponse>, StatusCode> {
    match state.table.state().await {
        Ok(table) => Ok(Json(table)),
        Err(e) => {
            error!("Failed to read table state: {}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
