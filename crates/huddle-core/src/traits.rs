//! Collaborator traits for Huddle
//!
//! The roster is an in-process orchestration layer. Everything it reads or
//! drives lives behind these traits, so the same roster logic runs against
//! the engine's session layer in production and [`MockSession`] in tests.
//!
//! ## Key Traits
//!
//! - [`SessionRegistry`]: Who is connected, and where their live data lives
//! - [`ParticipantSource`]: A participant's amplitude, mute flag, name and video
//! - [`SlotFactory`]: Instantiates the display prefab for a new slot
//! - [`RenderTarget`]: The per-slot material a video surface is attached to
//!
//! [`MockSession`]: crate::mock_session::MockSession

use std::sync::Arc;

use crate::error::SlotError;
use crate::event::{SessionEvent, Subscription};
use crate::identity::ParticipantId;
use crate::video::VideoSurfaceHandle;

/// Registry of the participants connected to the current session
///
/// Injected into the roster at construction; there is no global instance.
pub trait SessionRegistry: Send + Sync {
    /// All currently connected participants
    fn list_connected(&self) -> Vec<ParticipantId>;

    /// Find the live data source for a participant
    ///
    /// Returns `None` when the participant is unknown or its engine object
    /// has not been spawned yet (or was already destroyed).
    fn lookup(&self, id: ParticipantId) -> Option<Arc<dyn ParticipantSource>>;

    /// Listen for join/leave notifications
    fn subscribe(&self) -> Subscription<SessionEvent>;

    /// Check whether a participant is currently connected
    fn is_connected(&self, id: ParticipantId) -> bool {
        self.list_connected().contains(&id)
    }
}

/// Live data for one participant, owned by the session layer
///
/// The roster holds only weak references to sources; a source can vanish at
/// any moment without a prior leave event.
pub trait ParticipantSource: Send + Sync {
    /// Current voice amplitude, nominally in `0.0..=1.0`
    fn amplitude(&self) -> f32;

    /// Whether the participant muted themselves
    fn is_muted(&self) -> bool;

    /// The participant's chosen display name (may be empty)
    fn display_name(&self) -> String;

    /// The participant's video surface, once the capture camera produced one
    fn video_surface(&self) -> Option<VideoSurfaceHandle>;

    /// Listen for display name changes
    fn subscribe_names(&self) -> Subscription<String>;
}

/// The per-slot material instance a video surface is shown through
///
/// Each slot owns exactly one render target. Implementations release their
/// engine resources in `Drop`.
pub trait RenderTarget: Send {
    /// Show the given surface
    fn attach(&mut self, surface: &VideoSurfaceHandle);

    /// Stop showing any surface
    fn detach(&mut self);
}

/// Instantiates the visual prefab for a display slot
pub trait SlotFactory: Send {
    /// Create the render target for the slot at `index`
    ///
    /// Fails when the prefab lacks a required component. Destroying a slot
    /// is dropping the returned target.
    fn instantiate(&mut self, index: usize) -> Result<Box<dyn RenderTarget>, SlotError>;
}
