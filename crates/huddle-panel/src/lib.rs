//! # Huddle Panel
//!
//! Bounded display of the participants in a voice/video session.
//!
//! The panel tracks every connected participant, shows up to
//! `max_display_slots` of them in reusable slots, and refreshes each shown
//! slot once per tick with the participant's name, speaking state, voice
//! amplitude and video feed.
//!
//! ## Components
//!
//! - [`RosterTracker`]: participant -> source mapping and all subscriptions
//! - [`SlotAllocator`]: the bounded slot pool and participant -> slot mapping
//! - [`SyncLoop`]: per-tick push of live state into bound slots
//! - [`ParticipantPanel`]: owns the three and drives them from `tick`
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use huddle_core::{MockSession, MockSlotFactory, ParticipantId};
//! use huddle_panel::{PanelConfig, ParticipantPanel};
//!
//! let session = Arc::new(MockSession::new());
//! session.connect(ParticipantId(1), "Ada");
//!
//! let mut panel = ParticipantPanel::new(
//!     session.clone(),
//!     Box::new(MockSlotFactory::new()),
//!     PanelConfig::with_slots(4),
//! )?;
//! panel.activate()?;
//!
//! session.set_amplitude(ParticipantId(1), 0.5);
//! panel.tick();
//! assert!(panel.slot_for(ParticipantId(1)).unwrap().is_mic_on());
//! # Ok::<(), huddle_panel::PanelError>(())
//! ```

pub mod allocator;
pub mod config;
pub mod error;
pub mod panel;
pub mod slot;
pub mod sync;
pub mod tracker;

pub use allocator::SlotAllocator;
pub use config::{PanelConfig, PoolPolicy, ReassignPolicy};
pub use error::{PanelError, PanelResult};
pub use panel::ParticipantPanel;
pub use slot::{ParticipantSlot, SlotView};
pub use sync::{SyncLoop, SyncReport};
pub use tracker::{JoinOutcome, RosterTracker};
