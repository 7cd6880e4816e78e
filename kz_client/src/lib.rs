//! Internal modules for the Kazhutha client.
//!
//! This library provides command parsing, rendering and the WebSocket
//! session used by the kz_client binary.

pub mod commands;
pub mod display;
pub mod websocket_client;
