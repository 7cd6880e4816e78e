use serde::{Serialize, de::DeserializeOwned};

use super::errors::{Result, SerializationError};

/// Maximum frame size in bytes. A full snapshot for eight seats with a
/// complete trick stays far below this.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Encodes a message as a JSON text frame.
pub fn encode<T: Serialize>(value: &T) -> Result<String> {
    let text = serde_json::to_string(value)?;
    if text.len() > MAX_MESSAGE_SIZE {
        return Err(SerializationError::MessageTooLarge {
            actual: text.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(text)
}

/// Decodes a JSON text frame, refusing oversized input before parsing.
pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T> {
    if text.len() > MAX_MESSAGE_SIZE {
        return Err(SerializationError::MessageTooLarge {
            actual: text.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::messages::ClientMessage;

    #[test]
    fn decode_rejects_oversized_frames() {
        let huge = format!(r#"{{"type":"start_game","pad":"{}"}}"#, "x".repeat(MAX_MESSAGE_SIZE));
        assert!(matches!(
            decode::<ClientMessage>(&huge),
            Err(SerializationError::MessageTooLarge { .. })
        ));
    }

    #[test]
    fn decode_reports_malformed_json() {
        assert!(matches!(
            decode::<ClientMessage>("{not json"),
            Err(SerializationError::Json(_))
        ));
    }

    #[test]
    fn encode_produces_tagged_object() {
        let text = encode(&ClientMessage::StartGame).unwrap();
        assert_eq!(text, r#"{"type":"start_game"}"#);
    }
}
