//! Error types for Huddle

use thiserror::Error;

/// Top-level error type for Huddle collaborators
#[derive(Debug, Error)]
pub enum HuddleError {
    #[error("Slot error: {0}")]
    Slot(#[from] SlotError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Errors raised while creating a slot's display resources
#[derive(Debug, Error)]
pub enum SlotError {
    #[error("Display prefab is missing required component: {0}")]
    MissingComponent(String),

    #[error("Slot creation failed: {0}")]
    CreationFailed(String),
}

/// Errors related to the external session layer
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Participant not found: {0}")]
    ParticipantNotFound(String),

    #[error("Not connected to a session")]
    NotConnected,

    #[error("Event channel closed")]
    ChannelClosed,
}

/// Result type alias for Huddle collaborator operations
pub type HuddleResult<T> = Result<T, HuddleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_error_display() {
        let err = SlotError::MissingComponent("RenderTarget".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("missing required component"));
        assert!(msg.contains("RenderTarget"));

        let err = SlotError::CreationFailed("out of textures".to_string());
        assert!(format!("{}", err).contains("out of textures"));
    }

    #[test]
    fn test_session_error_display() {
        let err = SessionError::ParticipantNotFound("17".to_string());
        assert!(format!("{}", err).contains("17"));
        assert!(format!("{}", SessionError::NotConnected).contains("Not connected"));
        assert!(format!("{}", SessionError::ChannelClosed).contains("closed"));
    }

    #[test]
    fn test_error_conversions() {
        let err: HuddleError = SlotError::CreationFailed("x".to_string()).into();
        assert!(matches!(err, HuddleError::Slot(_)));

        let err: HuddleError = SessionError::NotConnected.into();
        assert!(matches!(err, HuddleError::Session(_)));
        assert!(format!("{}", err).contains("Session error"));
    }
}
