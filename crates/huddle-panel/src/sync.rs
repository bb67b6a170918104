//! Per-tick slot synchronization
//!
//! Every tick pulls the latest amplitude, mute state and video surface for
//! each displayed participant and pushes it into that participant's slot. A
//! participant whose source is unreachable is shown as silent with video
//! detached until the source comes back; the slot itself stays assigned.

use serde::Serialize;
use tracing::{debug, trace};

use crate::allocator::SlotAllocator;
use crate::tracker::RosterTracker;

/// What one sync pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Slots refreshed from a reachable source
    pub updated: usize,
    /// Slots shown silent because their source was unreachable
    pub degraded: usize,
    /// Slots that attached a video surface this pass
    pub video_bound: usize,
    /// Name changes applied to displayed slots
    pub renamed: usize,
}

impl SyncReport {
    /// Accumulate another report into this one
    pub fn merge(&mut self, other: &SyncReport) {
        self.updated += other.updated;
        self.degraded += other.degraded;
        self.video_bound += other.video_bound;
        self.renamed += other.renamed;
    }
}

/// Pushes live participant state into bound slots
#[derive(Debug, Clone, Copy)]
pub struct SyncLoop {
    speaking_threshold: f32,
}

impl SyncLoop {
    pub fn new(speaking_threshold: f32) -> Self {
        Self { speaking_threshold }
    }

    /// Amplitude above which an unmuted participant counts as speaking
    pub fn speaking_threshold(&self) -> f32 {
        self.speaking_threshold
    }

    /// The mic-on rule: unmuted and strictly louder than the threshold
    pub fn is_speaking(&self, muted: bool, amplitude: f32) -> bool {
        !muted && amplitude > self.speaking_threshold
    }

    /// Run one sync pass over every bound slot
    pub fn tick(&self, tracker: &mut RosterTracker, allocator: &mut SlotAllocator) -> SyncReport {
        let mut report = SyncReport::default();

        for participant in allocator.assigned_ids() {
            let source = tracker.resolve_source(participant);
            let Some(slot) = allocator.slot_mut(participant) else {
                continue;
            };

            match source {
                Some(source) => {
                    let amplitude = source.amplitude();
                    slot.set_amplitude(amplitude);
                    slot.set_mic_state(self.is_speaking(source.is_muted(), amplitude));

                    if !slot.is_video_set() {
                        if let Some(surface) = source.video_surface() {
                            if slot.try_set_video_feed(Some(&surface)) {
                                debug!(participant = %participant, surface = %surface, "video bound");
                                report.video_bound += 1;
                            }
                        }
                    }
                    report.updated += 1;
                }
                None => {
                    slot.set_amplitude(0.0);
                    slot.set_mic_state(false);
                    if slot.is_video_set() {
                        slot.try_set_video_feed(None);
                    }
                    report.degraded += 1;
                }
            }
        }

        for (participant, name) in tracker.drain_name_changes() {
            let Some(slot) = allocator.slot_mut(participant) else {
                trace!(participant = %participant, "name change for hidden participant dropped");
                continue;
            };
            slot.set_name(&name);
            report.renamed += 1;
        }

        report
    }
}
