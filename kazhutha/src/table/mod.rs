//! The host side of a table.
//!
//! This module implements:
//! - TableActor: Async actor owning the authoritative game for one table
//! - TableHandle: Cloneable sender used by the server and local players
//! - Trick pause and bot think timers, cancelled by generation
//!
//! ## Architecture
//!
//! The actor runs in its own Tokio task with an mpsc inbox. Every change to
//! the game is followed by a publish: each participant gets the public
//! snapshot, then its own hand, then any new log entries, in that order.
//!
//! ## Example
//!
//! ```no_run
//! use kazhutha::table::{TableActor, TableConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (actor, handle) = TableActor::new(TableConfig::default());
//!     tokio::spawn(actor.run());
//!
//!     let state = handle.state().await.unwrap();
//!     println!("{} participants", state.roster.len());
//! }
//! ```

pub mod actor;
pub mod config;
pub mod messages;

pub use actor::{TableActor, TableClosed, TableHandle};
pub use config::TableConfig;
pub use messages::{TableMessage, TableResponse, TableStateResponse};
