//! Host process for a Kazhutha table.
//!
//! Owns one authoritative [`kazhutha::TableActor`] and exposes it over
//! HTTP and WebSocket. Every WebSocket connection becomes a mirror of the
//! table: it joins with a `request_join` frame and from then on receives
//! snapshots, its own hand, prompts and log entries.

pub mod api;
pub mod config;
pub mod logging;
