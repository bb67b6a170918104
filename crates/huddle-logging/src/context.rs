//! Participant context injection
//!
//! Thread-local storage for the identity of the participant whose panel is
//! running, so every span opened in that scope can carry it.

use std::cell::RefCell;

use huddle_core::ParticipantId;
use uuid::Uuid;

/// Participant context data stored in thread-local storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantContextData {
    /// The local participant owning the panel
    pub participant: ParticipantId,
    /// Free-form label for the scope (session or scenario name)
    pub scope: Option<String>,
    /// Unique instance ID for this panel session
    pub instance_id: Uuid,
}

thread_local! {
    static PARTICIPANT_CONTEXT: RefCell<Option<ParticipantContextData>> = const { RefCell::new(None) };
}

/// RAII guard for participant context
///
/// Sets the context for the current thread and restores the previous one
/// when dropped.
///
/// ```rust
/// use huddle_core::ParticipantId;
/// use huddle_logging::ParticipantContextGuard;
///
/// {
///     let _guard = ParticipantContextGuard::new(ParticipantId(7));
///     assert_eq!(ParticipantContextGuard::current_participant(), Some(ParticipantId(7)));
/// }
/// assert!(ParticipantContextGuard::current().is_none());
/// ```
pub struct ParticipantContextGuard {
    previous: Option<ParticipantContextData>,
}

impl ParticipantContextGuard {
    /// Set the local participant for the current scope
    pub fn new(participant: ParticipantId) -> Self {
        Self::install(ParticipantContextData {
            participant,
            scope: None,
            instance_id: Uuid::new_v4(),
        })
    }

    /// Set the local participant and a scope label
    pub fn with_scope(participant: ParticipantId, scope: impl Into<String>) -> Self {
        Self::install(ParticipantContextData {
            participant,
            scope: Some(scope.into()),
            instance_id: Uuid::new_v4(),
        })
    }

    /// Set a context with a fixed instance ID
    pub fn with_instance_id(participant: ParticipantId, instance_id: Uuid) -> Self {
        Self::install(ParticipantContextData {
            participant,
            scope: None,
            instance_id,
        })
    }

    fn install(data: ParticipantContextData) -> Self {
        let previous = PARTICIPANT_CONTEXT.with(|ctx| ctx.borrow_mut().replace(data));
        Self { previous }
    }

    /// Get the current context (if any)
    pub fn current() -> Option<ParticipantContextData> {
        PARTICIPANT_CONTEXT.with(|ctx| ctx.borrow().clone())
    }

    /// Get the current participant (if set)
    pub fn current_participant() -> Option<ParticipantId> {
        PARTICIPANT_CONTEXT.with(|ctx| ctx.borrow().as_ref().map(|data| data.participant))
    }

    /// Get the current instance ID (if set)
    pub fn current_instance_id() -> Option<Uuid> {
        PARTICIPANT_CONTEXT.with(|ctx| ctx.borrow().as_ref().map(|data| data.instance_id))
    }
}

impl Drop for ParticipantContextGuard {
    fn drop(&mut self) {
        PARTICIPANT_CONTEXT.with(|ctx| *ctx.borrow_mut() = self.previous.take());
    }
}

/// Run a block with a participant context set
///
/// ```rust
/// use huddle_core::ParticipantId;
/// use huddle_logging::with_participant_context;
///
/// let seen = with_participant_context!(ParticipantId(3), {
///     huddle_logging::ParticipantContextGuard::current_participant()
/// });
/// assert_eq!(seen, Some(ParticipantId(3)));
/// ```
#[macro_export]
macro_rules! with_participant_context {
    ($participant:expr, $body:block) => {{
        let _guard = $crate::context::ParticipantContextGuard::new($participant);
        $body
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_context_guard() {
        assert!(ParticipantContextGuard::current().is_none());

        {
            let _guard = ParticipantContextGuard::new(ParticipantId(1));
            let ctx = ParticipantContextGuard::current().unwrap();
            assert_eq!(ctx.participant, ParticipantId(1));
            assert!(ctx.scope.is_none());
        }

        assert!(ParticipantContextGuard::current().is_none());
    }

    #[test]
    fn test_nested_contexts() {
        {
            let _outer = ParticipantContextGuard::with_scope(ParticipantId(1), "overflow");
            {
                let _inner = ParticipantContextGuard::new(ParticipantId(2));
                assert_eq!(
                    ParticipantContextGuard::current_participant(),
                    Some(ParticipantId(2))
                );
            }
            let ctx = ParticipantContextGuard::current().unwrap();
            assert_eq!(ctx.participant, ParticipantId(1));
            assert_eq!(ctx.scope.as_deref(), Some("overflow"));
        }
        assert!(ParticipantContextGuard::current_participant().is_none());
    }

    #[test]
    fn test_with_instance_id() {
        let instance_id = Uuid::new_v4();
        let _guard = ParticipantContextGuard::with_instance_id(ParticipantId(4), instance_id);
        assert_eq!(ParticipantContextGuard::current_instance_id(), Some(instance_id));
    }
}
