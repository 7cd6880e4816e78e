//! Protocol versioning for join compatibility.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire protocol revision a participant speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtocolVersion(pub u16);

impl ProtocolVersion {
    pub const V1: ProtocolVersion = ProtocolVersion(1);

    /// Get the current protocol version
    pub fn current() -> Self {
        Self::V1
    }

    /// Check if this version can join a table speaking `other`.
    pub fn is_compatible_with(&self, other: &ProtocolVersion) -> bool {
        self == other
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_version() {
        assert_eq!(ProtocolVersion::current(), ProtocolVersion::V1);
        assert_eq!(ProtocolVersion::default().to_string(), "v1");
    }

    #[test]
    fn test_compatibility() {
        assert!(ProtocolVersion::V1.is_compatible_with(&ProtocolVersion::V1));
        assert!(!ProtocolVersion(2).is_compatible_with(&ProtocolVersion::V1));
    }

    #[test]
    fn test_serializes_as_plain_number() {
        assert_eq!(serde_json::to_string(&ProtocolVersion::V1).unwrap(), "1");
        let parsed: ProtocolVersion = serde_json::from_str("7").unwrap();
        assert_eq!(parsed, ProtocolVersion(7));
    }
}
