//! Error types for the participant panel

use huddle_core::{ParticipantId, SlotError};
use thiserror::Error;

/// Errors that can occur while managing the panel
#[derive(Debug, Error)]
pub enum PanelError {
    /// The session layer had no source for a participant
    #[error("No source found for participant {0}")]
    SourceNotFound(ParticipantId),

    /// The display prefab could not be instantiated
    #[error("Slot creation failed: {0}")]
    SlotCreation(#[from] SlotError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for panel operations
pub type PanelResult<T> = Result<T, PanelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_error_display() {
        let err = PanelError::SourceNotFound(ParticipantId(9));
        assert!(format!("{}", err).contains("participant 9"));

        let err: PanelError = SlotError::MissingComponent("material".to_string()).into();
        assert!(matches!(err, PanelError::SlotCreation(_)));
        assert!(format!("{}", err).contains("material"));

        let err = PanelError::Config("bad".to_string());
        assert!(format!("{}", err).contains("Configuration error"));
    }
}
