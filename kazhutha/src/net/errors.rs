//! Network error types for serialization and protocol operations.

use thiserror::Error;

/// Errors that can occur while encoding or decoding a frame.
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("invalid JSON frame: {0}")]
    Json(#[from] serde_json::Error),

    /// Message size exceeded maximum allowed
    #[error("message size {actual} exceeds maximum {max}")]
    MessageTooLarge { actual: usize, max: usize },
}

/// Result type for serialization operations
pub type Result<T> = std::result::Result<T, SerializationError>;
