//! Wire protocol shared by the server and clients.
//!
//! Every frame is a single JSON object tagged by `type`. The host is the
//! only writer of game state; clients send requests and receive snapshots.

/// Error types for encoding and decoding frames.
pub mod errors;

/// Message types for the client-server protocol.
pub mod messages;

/// Protocol versioning checked at join.
pub mod protocol_version;

/// JSON frame helpers with a size limit.
pub mod utils;
