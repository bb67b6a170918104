//! # Huddle Simulation
//!
//! Runs a [`ParticipantPanel`](huddle_panel::ParticipantPanel) against an
//! in-memory session to exercise the roster under scripted and random churn.
//!
//! - **Simulation** (`simulation.rs`): tick-driven engine with event log and stats
//! - **Scenarios** (`scenarios.rs`): overflow, dropout, late video and churn runs
//!
//! ## Example
//!
//! ```rust
//! use huddle_core::ParticipantId;
//! use huddle_panel::PanelConfig;
//! use huddle_simulation::RosterSim;
//!
//! let mut sim = RosterSim::new(PanelConfig::with_slots(2))?;
//! sim.join(ParticipantId(1), "Ada");
//! sim.join(ParticipantId(2), "Bo");
//! sim.join(ParticipantId(3), "Cy");
//! sim.step()?;
//!
//! assert_eq!(sim.panel.allocator().bound_count(), 2);
//! assert_eq!(sim.stats.max_waiting, 1);
//! # Ok::<(), huddle_simulation::SimError>(())
//! ```

pub mod scenarios;
pub mod simulation;

pub use simulation::{ChurnConfig, RosterSim, SimError, SimEvent, SimResult, SimStats};
