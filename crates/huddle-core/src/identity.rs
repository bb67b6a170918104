//! Participant identity
//!
//! A [`ParticipantId`] is the opaque integer the session layer hands out for
//! each connected participant. It is stable for the lifetime of a connection
//! and never reused while that participant remains connected.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Label used by the session layer for participants that never set a name
pub const PLACEHOLDER_NAME: &str = "Player";

/// Opaque, stable identity of a connected participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub u64);

impl ParticipantId {
    /// Create an identity from its raw session value
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw session value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Generate identities `start..start + count` in ascending order
    pub fn range(start: u64, count: usize) -> Vec<Self> {
        (start..start + count as u64).map(Self).collect()
    }

    /// Label shown when the participant has no usable name
    pub fn fallback_name(&self) -> String {
        format!("{} {}", PLACEHOLDER_NAME, self.0)
    }

    /// Pick the label to show for this participant
    ///
    /// Empty names and the session layer's bare placeholder are replaced
    /// with [`fallback_name`](Self::fallback_name). Anything else, whitespace
    /// included, is shown as given.
    pub fn display_name_or_fallback(&self, name: &str) -> String {
        if name.is_empty() || name == PLACEHOLDER_NAME {
            self.fallback_name()
        } else {
            name.to_string()
        }
    }
}

impl Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ParticipantId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_range() {
        let ids = ParticipantId::range(10, 3);
        assert_eq!(ids.len(), 3);
        assert_eq!(ids[0], ParticipantId(10));
        assert_eq!(ids[2], ParticipantId(12));
    }

    #[test]
    fn test_fallback_name() {
        let id = ParticipantId::new(7);
        assert_eq!(id.fallback_name(), "Player 7");
        assert_eq!(id.display_name_or_fallback(""), "Player 7");
        assert_eq!(id.display_name_or_fallback("Player"), "Player 7");
        // Only the exact placeholder is replaced
        assert_eq!(id.display_name_or_fallback("   "), "   ");
        assert_eq!(id.display_name_or_fallback(" Player "), " Player ");
        assert_eq!(id.display_name_or_fallback("player"), "player");
        assert_eq!(id.display_name_or_fallback("Ada"), "Ada");
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = ParticipantId(42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "42");
        let back: ParticipantId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
