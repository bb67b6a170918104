//! The participant panel
//!
//! [`ParticipantPanel`] wires a [`RosterTracker`], a [`SlotAllocator`] and a
//! [`SyncLoop`] together and drives them from a single `tick`. Dropping the
//! panel deactivates it, so subscriptions and render targets are released on
//! every path.

use std::sync::Arc;

use huddle_core::{ParticipantId, SessionRegistry, SlotFactory};
use tracing::{debug, info, instrument};

use crate::allocator::SlotAllocator;
use crate::config::PanelConfig;
use crate::error::PanelResult;
use crate::slot::{ParticipantSlot, SlotView};
use crate::sync::{SyncLoop, SyncReport};
use crate::tracker::{JoinOutcome, RosterTracker};

/// Bounded display of the participants in a session
#[derive(Debug)]
pub struct ParticipantPanel {
    config: PanelConfig,
    tracker: RosterTracker,
    allocator: SlotAllocator,
    sync: SyncLoop,
    ticks: u64,
}

impl ParticipantPanel {
    /// Create an inactive panel
    ///
    /// Fails if the configuration is out of range.
    pub fn new(
        registry: Arc<dyn SessionRegistry>,
        factory: Box<dyn SlotFactory>,
        config: PanelConfig,
    ) -> PanelResult<Self> {
        config.validate()?;
        Ok(Self {
            tracker: RosterTracker::new(registry, config.reassign),
            allocator: SlotAllocator::new(config.max_display_slots, config.pool_policy, factory),
            sync: SyncLoop::new(config.speaking_threshold),
            ticks: 0,
            config,
        })
    }

    /// Subscribe to the session and show everyone already connected
    ///
    /// Returns the number of tracked participants.
    pub fn activate(&mut self) -> PanelResult<usize> {
        if self.config.prewarm_slots {
            self.allocator.prewarm()?;
        }
        let tracked = self.tracker.activate(&mut self.allocator);
        Ok(tracked)
    }

    /// Apply queued join/leave notifications, then refresh every bound slot
    #[instrument(skip(self), fields(tick = self.ticks))]
    pub fn tick(&mut self) -> SyncReport {
        self.ticks += 1;
        let events = self.tracker.pump_events(&mut self.allocator);
        let report = self.sync.tick(&mut self.tracker, &mut self.allocator);
        if events > 0 || report.degraded > 0 || report.video_bound > 0 || report.renamed > 0 {
            debug!(
                events,
                updated = report.updated,
                degraded = report.degraded,
                video_bound = report.video_bound,
                renamed = report.renamed,
                "panel tick"
            );
        }
        report
    }

    /// Process a join directly, bypassing the session subscription
    pub fn handle_join(&mut self, participant: ParticipantId) -> JoinOutcome {
        self.tracker
            .on_participant_joined(participant, &mut self.allocator)
    }

    /// Process a leave directly, bypassing the session subscription
    pub fn handle_leave(&mut self, participant: ParticipantId) -> bool {
        self.tracker
            .on_participant_left(participant, &mut self.allocator)
    }

    /// Drop every subscription and destroy every slot
    pub fn deactivate(&mut self) {
        let was_active = self.tracker.is_active();
        self.tracker.deactivate(&mut self.allocator);
        self.allocator.destroy_all();
        if was_active {
            info!(ticks = self.ticks, "panel deactivated");
        }
    }

    /// Override the mic indicator of a displayed participant
    ///
    /// The next tick recomputes it from the source. Returns false if the
    /// participant is not displayed.
    pub fn set_mic_status(&mut self, participant: ParticipantId, transmitting: bool) -> bool {
        match self.allocator.slot_mut(participant) {
            Some(slot) => {
                slot.set_mic_state(transmitting);
                true
            }
            None => false,
        }
    }

    /// The slot showing `participant`
    pub fn slot_for(&self, participant: ParticipantId) -> Option<&ParticipantSlot> {
        self.allocator.slot(participant)
    }

    /// View of every position, empty positions included
    pub fn snapshot(&self) -> Vec<SlotView> {
        (0..self.allocator.capacity())
            .map(|index| match self.allocator.slot_at(index) {
                Some(slot) => slot.view(),
                None => SlotView {
                    index,
                    participant: None,
                    name: String::new(),
                    mic_on: false,
                    amplitude: 0.0,
                    video: None,
                },
            })
            .collect()
    }

    pub fn tracker(&self) -> &RosterTracker {
        &self.tracker
    }

    pub fn allocator(&self) -> &SlotAllocator {
        &self.allocator
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// Whether the panel is subscribed to the session
    pub fn is_active(&self) -> bool {
        self.tracker.is_active()
    }

    /// Number of ticks run so far
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }
}

impl Drop for ParticipantPanel {
    fn drop(&mut self) {
        self.deactivate();
    }
}
