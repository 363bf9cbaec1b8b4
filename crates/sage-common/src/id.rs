use serde::{Deserialize, Serialize};
use std::fmt;

/// Generate a short correlation id (8 hex chars) for tying together the
/// log lines of a single request or chat turn.
pub fn new_correlation_id() -> String {
    let uuid = uuid::Uuid::new_v4();
    let bytes = uuid.as_bytes();
    format!(
        "{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3]
    )
}

/// Server-assigned identifier of a chat session.
///
/// Opaque to the client beyond equality and display: the backend hands one
/// out on session creation and it never changes afterwards.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SessionId(pub i64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_id_length() {
        let cid = new_correlation_id();
        assert_eq!(cid.len(), 8);
    }

    #[test]
    fn correlation_id_is_hex() {
        let cid = new_correlation_id();
        assert!(cid.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn correlation_id_is_unique() {
        let a = new_correlation_id();
        let b = new_correlation_id();
        assert_ne!(a, b);
    }

    #[test]
    fn session_id_display() {
        assert_eq!(SessionId(42).to_string(), "42");
    }

    #[test]
    fn session_id_serializes_as_bare_number() {
        let json = serde_json::to_string(&SessionId(7)).unwrap();
        assert_eq!(json, "7");

        let parsed: SessionId = serde_json::from_str("7").unwrap();
        assert_eq!(parsed, SessionId(7));
    }

    #[test]
    fn session_id_equality_and_hash() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(SessionId(1));
        set.insert(SessionId(1));
        set.insert(SessionId(2));
        assert_eq!(set.len(), 2);
    }
}
