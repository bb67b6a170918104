//! # Huddle Core
//!
//! Core traits, types, and errors for the Huddle participant roster.
//!
//! This crate provides the collaborator surface the roster is written
//! against, so the same slot allocation and sync logic runs on top of the
//! engine's session layer and on top of an in-memory mock in tests.
//!
//! ## Key Traits
//!
//! - [`SessionRegistry`]: Connected participants, source lookup, join/leave events
//! - [`ParticipantSource`]: Voice amplitude, mute flag, name and video of one participant
//! - [`SlotFactory`] / [`RenderTarget`]: Display prefab instantiation and per-slot material
//!
//! ## Key Types
//!
//! - [`ParticipantId`]: Opaque stable participant identity
//! - [`SessionEvent`]: Join/leave notifications
//! - [`Subscription`] / [`Broadcaster`]: RAII listener registration
//! - [`VideoSurfaceHandle`]: Reference to an externally owned video surface

pub mod error;
pub mod identity;
pub mod event;
pub mod video;
pub mod traits;
pub mod mock_session;

// Re-export main types
pub use error::*;
pub use identity::*;
pub use event::*;
pub use video::*;
pub use traits::*;
pub use mock_session::*;
