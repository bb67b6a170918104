//! Roster simulation engine
//!
//! Drives a [`ParticipantPanel`] against an in-memory [`MockSession`]:
//! - Scripted or random joins, leaves and source dropouts
//! - Amplitude, mute and video changes between ticks
//! - Slot cap verification after every tick

use std::sync::Arc;

use huddle_core::{MockSession, MockSlotFactory, ParticipantId, RenderStats, SessionRegistry};
use huddle_panel::{PanelConfig, PanelError, ParticipantPanel, SlotView, SyncReport};
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised while running a simulation
#[derive(Debug, Error)]
pub enum SimError {
    /// The panel could not be built or activated
    #[error("Panel error: {0}")]
    Panel(#[from] PanelError),

    /// More slots were bound than the configuration allows
    #[error("Slot cap exceeded at tick {tick}: {bound} bound, {max} allowed")]
    SlotCapExceeded { tick: u64, bound: usize, max: usize },
}

/// Result type alias for simulation operations
pub type SimResult<T> = Result<T, SimError>;

/// One recorded session change
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    Joined { tick: u64, participant: ParticipantId },
    Left { tick: u64, participant: ParticipantId },
    SourceLost { tick: u64, participant: ParticipantId },
    SourceRestored { tick: u64, participant: ParticipantId },
    VideoSpawned { tick: u64, participant: ParticipantId },
    Renamed { tick: u64, participant: ParticipantId, name: String },
}

/// Simulation statistics
#[derive(Debug, Clone, Default)]
pub struct SimStats {
    pub ticks: u64,
    pub joins: u64,
    pub leaves: u64,
    pub source_losses: u64,
    pub source_restores: u64,
    pub amplitude_changes: u64,
    pub renames: u64,
    /// Highest number of simultaneously bound slots seen
    pub max_bound: usize,
    /// Highest number of waiting participants seen
    pub max_waiting: usize,
    /// Sync totals across every tick
    pub sync: SyncReport,
}

/// Random event weights for [`RosterSim::run_random`]
#[derive(Debug, Clone)]
pub struct ChurnConfig {
    /// Size of the participant id space
    pub population: u64,
    pub join_probability: f64,
    pub leave_probability: f64,
    pub dropout_probability: f64,
    pub restore_probability: f64,
    pub video_probability: f64,
    pub rename_probability: f64,
}

impl Default for ChurnConfig {
    fn default() -> Self {
        Self {
            population: 12,
            join_probability: 0.35,
            leave_probability: 0.2,
            dropout_probability: 0.05,
            restore_probability: 0.1,
            video_probability: 0.1,
            rename_probability: 0.05,
        }
    }
}

/// A panel wired to a mock session
#[derive(Debug)]
pub struct RosterSim {
    pub session: Arc<MockSession>,
    pub panel: ParticipantPanel,
    pub render: Arc<RenderStats>,
    pub tick: u64,
    pub event_log: Vec<SimEvent>,
    pub stats: SimStats,
}

impl RosterSim {
    /// Build and activate a panel over an empty session
    pub fn new(config: PanelConfig) -> SimResult<Self> {
        let session = Arc::new(MockSession::new());
        let factory = MockSlotFactory::new();
        let render = factory.stats();
        let mut panel = ParticipantPanel::new(session.clone(), Box::new(factory), config)?;
        panel.activate()?;
        Ok(Self {
            session,
            panel,
            render,
            tick: 0,
            event_log: Vec::new(),
            stats: SimStats::default(),
        })
    }

    /// Connect a participant with a spawned source
    pub fn join(&mut self, participant: ParticipantId, name: &str) {
        self.session.connect(participant, name);
        self.stats.joins += 1;
        self.event_log.push(SimEvent::Joined {
            tick: self.tick,
            participant,
        });
    }

    /// Disconnect a participant
    pub fn leave(&mut self, participant: ParticipantId) {
        if self.session.disconnect(participant) {
            self.stats.leaves += 1;
            self.event_log.push(SimEvent::Left {
                tick: self.tick,
                participant,
            });
        }
    }

    /// Destroy a participant's source without a leave
    pub fn lose_source(&mut self, participant: ParticipantId) {
        if self.session.make_unreachable(participant) {
            self.stats.source_losses += 1;
            self.event_log.push(SimEvent::SourceLost {
                tick: self.tick,
                participant,
            });
        }
    }

    /// Respawn a lost source
    pub fn restore_source(&mut self, participant: ParticipantId) {
        if self.session.restore(participant) {
            self.stats.source_restores += 1;
            self.event_log.push(SimEvent::SourceRestored {
                tick: self.tick,
                participant,
            });
        }
    }

    /// Give a participant a video surface
    pub fn spawn_video(&mut self, participant: ParticipantId) {
        if self.session.spawn_video(participant).is_some() {
            self.event_log.push(SimEvent::VideoSpawned {
                tick: self.tick,
                participant,
            });
        }
    }

    pub fn set_amplitude(&mut self, participant: ParticipantId, amplitude: f32) {
        self.session.set_amplitude(participant, amplitude);
        self.stats.amplitude_changes += 1;
    }

    pub fn rename(&mut self, participant: ParticipantId, name: &str) {
        self.session.rename(participant, name);
        self.stats.renames += 1;
        self.event_log.push(SimEvent::Renamed {
            tick: self.tick,
            participant,
            name: name.to_string(),
        });
    }

    /// Advance one tick and verify the slot cap
    pub fn step(&mut self) -> SimResult<SyncReport> {
        self.tick += 1;
        self.stats.ticks += 1;
        let report = self.panel.tick();
        self.stats.sync.merge(&report);

        let allocator = self.panel.allocator();
        let bound = allocator.bound_count();
        let max = self.panel.config().max_display_slots;
        if bound > max {
            warn!(tick = self.tick, bound, max, "slot cap exceeded");
            return Err(SimError::SlotCapExceeded {
                tick: self.tick,
                bound,
                max,
            });
        }

        let waiting = self.panel.tracker().waiting(allocator).len();
        self.stats.max_bound = self.stats.max_bound.max(bound);
        self.stats.max_waiting = self.stats.max_waiting.max(waiting);
        Ok(report)
    }

    /// Advance `ticks` ticks
    pub fn run_ticks(&mut self, ticks: u64) -> SimResult<()> {
        for _ in 0..ticks {
            self.step()?;
        }
        Ok(())
    }

    /// Apply one round of random session changes
    pub fn random_round<R: Rng>(&mut self, rng: &mut R, churn: &ChurnConfig) {
        let participant = ParticipantId(rng.random_range(1..=churn.population));
        let connected = self.session.is_connected(participant);

        if !connected {
            if rng.random_bool(churn.join_probability) {
                self.join(participant, "");
            }
        } else if rng.random_bool(churn.leave_probability) {
            self.leave(participant);
        } else if rng.random_bool(churn.dropout_probability) {
            self.lose_source(participant);
        } else if rng.random_bool(churn.restore_probability) {
            self.restore_source(participant);
        } else if rng.random_bool(churn.video_probability) {
            self.spawn_video(participant);
        } else if rng.random_bool(churn.rename_probability) {
            let name = format!("Guest {}", rng.random_range(100..1000));
            self.rename(participant, &name);
        }

        // Every connected participant talks a little each round
        for speaker in ParticipantId::range(1, churn.population as usize) {
            if rng.random_bool(0.3) {
                self.set_amplitude(speaker, rng.random_range(0.0..1.0));
            }
        }
    }

    /// Run `ticks` random rounds, stepping after each
    pub fn run_random<R: Rng>(&mut self, rng: &mut R, churn: &ChurnConfig, ticks: u64) -> SimResult<()> {
        info!(ticks, population = churn.population, "starting random churn");
        for _ in 0..ticks {
            self.random_round(rng, churn);
            let report = self.step()?;
            debug!(tick = self.tick, ?report, "churn tick");
        }
        Ok(())
    }

    /// Current view of every slot position
    pub fn snapshot(&self) -> Vec<SlotView> {
        self.panel.snapshot()
    }

    /// Multi-line rendering of the panel
    pub fn render_panel(&self) -> String {
        self.snapshot()
            .iter()
            .map(|view| format!("  {}", view))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// One-line summary of the current state
    pub fn state_summary(&self) -> String {
        let allocator = self.panel.allocator();
        format!(
            "Tick {}: {} connected, {} tracked, {} displayed, {} waiting, {} render targets",
            self.tick,
            self.session.connected_count(),
            self.panel.tracker().tracked_count(),
            allocator.bound_count(),
            self.panel.tracker().waiting(allocator).len(),
            self.render.live()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_step_counts_ticks() {
        let mut sim = RosterSim::new(PanelConfig::with_slots(2)).unwrap();
        sim.join(ParticipantId(1), "Ada");
        sim.run_ticks(3).unwrap();
        assert_eq!(sim.tick, 3);
        assert_eq!(sim.stats.ticks, 3);
        assert_eq!(sim.stats.max_bound, 1);
    }

    #[test]
    fn test_event_log_records_changes() {
        let mut sim = RosterSim::new(PanelConfig::with_slots(2)).unwrap();
        sim.join(ParticipantId(1), "Ada");
        sim.lose_source(ParticipantId(1));
        sim.restore_source(ParticipantId(1));
        sim.leave(ParticipantId(1));
        // Unknown participant: nothing recorded
        sim.leave(ParticipantId(9));

        assert_eq!(sim.event_log.len(), 4);
        assert_eq!(sim.stats.leaves, 1);
    }

    #[test]
    fn test_random_run_respects_cap() {
        let mut sim = RosterSim::new(PanelConfig::with_slots(3)).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        sim.run_random(&mut rng, &ChurnConfig::default(), 300).unwrap();
        assert!(sim.stats.max_bound <= 3);
        assert_eq!(sim.stats.ticks, 300);
    }

    #[test]
    fn test_summary_mentions_counts() {
        let mut sim = RosterSim::new(PanelConfig::with_slots(1)).unwrap();
        sim.join(ParticipantId(1), "Ada");
        sim.join(ParticipantId(2), "Bo");
        sim.step().unwrap();
        let summary = sim.state_summary();
        assert!(summary.contains("1 displayed"));
        assert!(summary.contains("1 waiting"));
    }
}
