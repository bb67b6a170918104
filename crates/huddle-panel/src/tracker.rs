//! Roster tracking
//!
//! The [`RosterTracker`] is the authoritative record of which participants
//! are connected and where their live data lives. It is the only writer of
//! the participant -> source mapping and owns every subscription the panel
//! holds: one on the session registry for join/leave notifications and one
//! per tracked participant for name changes.
//!
//! Sources are cached as [`Weak`] references. A source destroyed by the
//! session layer shows up as a failed upgrade, after which the tracker tries a
//! fresh registry lookup on every read until the source reappears or the
//! participant leaves. A missing source is a normal transient state, not an
//! error, and never removes a participant from the roster.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use huddle_core::{ParticipantId, ParticipantSource, SessionEvent, SessionRegistry, Subscription};
use tracing::{debug, error, info, instrument, warn};

use crate::allocator::SlotAllocator;
use crate::config::ReassignPolicy;

/// Result of processing a join notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Tracked and shown in the given slot
    Displayed(usize),
    /// Tracked, but every slot is taken
    Waiting,
    /// Already tracked; nothing changed
    AlreadyTracked,
    /// The session layer had no source; the join was ignored
    SourceMissing,
    /// The slot could not be created; tracking was rolled back
    Rejected,
}

impl JoinOutcome {
    /// Whether the participant is tracked after this join
    pub fn is_tracked(&self) -> bool {
        matches!(self, Self::Displayed(_) | Self::Waiting | Self::AlreadyTracked)
    }
}

#[derive(Debug)]
struct TrackedParticipant {
    source: Weak<dyn ParticipantSource>,
    join_seq: u64,
    reachable: bool,
}

/// Authoritative participant -> source mapping
pub struct RosterTracker {
    registry: Arc<dyn SessionRegistry>,
    reassign: ReassignPolicy,
    roster: HashMap<ParticipantId, TrackedParticipant>,
    /// Name-change listeners keyed by participant
    name_listeners: HashMap<ParticipantId, Subscription<String>>,
    session_events: Option<Subscription<SessionEvent>>,
    next_join_seq: u64,
}

impl std::fmt::Debug for RosterTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RosterTracker")
            .field("tracked", &self.roster.len())
            .field("name_listeners", &self.name_listeners.len())
            .field("active", &self.session_events.is_some())
            .field("reassign", &self.reassign)
            .finish()
    }
}

impl RosterTracker {
    /// Create an inactive tracker over the given session registry
    pub fn new(registry: Arc<dyn SessionRegistry>, reassign: ReassignPolicy) -> Self {
        Self {
            registry,
            reassign,
            roster: HashMap::new(),
            name_listeners: HashMap::new(),
            session_events: None,
            next_join_seq: 0,
        }
    }

    /// Start tracking the session
    ///
    /// Clears any existing state, subscribes to join/leave notifications and
    /// processes every currently connected participant as a join. Calling it
    /// again re-populates from scratch. Returns the number of participants
    /// tracked afterwards.
    pub fn activate(&mut self, allocator: &mut SlotAllocator) -> usize {
        self.deactivate(allocator);
        self.session_events = Some(self.registry.subscribe());

        let connected = self.registry.list_connected();
        for participant in &connected {
            self.on_participant_joined(*participant, allocator);
        }

        info!(
            connected = connected.len(),
            tracked = self.roster.len(),
            displayed = allocator.bound_count(),
            "roster activated"
        );
        self.roster.len()
    }

    /// Stop tracking the session
    ///
    /// Drops every subscription, reclaims every slot and forgets every
    /// participant.
    pub fn deactivate(&mut self, allocator: &mut SlotAllocator) {
        let was_active = self.session_events.take().is_some();
        self.name_listeners.clear();
        let reclaimed = allocator.reclaim_all();
        self.roster.clear();
        if was_active {
            info!(reclaimed, "roster deactivated");
        }
    }

    /// Whether the tracker is subscribed to the session
    pub fn is_active(&self) -> bool {
        self.session_events.is_some()
    }

    /// Apply queued join/leave notifications in arrival order
    ///
    /// Afterwards any free slot goes to participants still waiting, so a
    /// waiter skipped earlier is retried once its source is back. Returns the
    /// number of notifications processed.
    pub fn pump_events(&mut self, allocator: &mut SlotAllocator) -> usize {
        let Some(events) = self.session_events.as_mut().map(|sub| sub.drain()) else {
            return 0;
        };
        for event in &events {
            match event {
                SessionEvent::Joined { participant, .. } => {
                    self.on_participant_joined(*participant, allocator);
                }
                SessionEvent::Left { participant, .. } => {
                    self.on_participant_left(*participant, allocator);
                }
            }
        }
        self.fill_free_slots(allocator);
        events.len()
    }

    /// Start tracking a participant and try to give it a slot
    #[instrument(skip(self, allocator), fields(participant = %participant))]
    pub fn on_participant_joined(
        &mut self,
        participant: ParticipantId,
        allocator: &mut SlotAllocator,
    ) -> JoinOutcome {
        if self.roster.contains_key(&participant) {
            debug!("join ignored, already tracked");
            return JoinOutcome::AlreadyTracked;
        }
        // Earlier waiters take free capacity before the newcomer
        self.fill_free_slots(allocator);

        let Some(source) = self.registry.lookup(participant) else {
            error!("could not find a source for joining participant");
            return JoinOutcome::SourceMissing;
        };

        let join_seq = self.next_join_seq;
        self.next_join_seq += 1;
        self.roster.insert(
            participant,
            TrackedParticipant {
                source: Arc::downgrade(&source),
                join_seq,
                reachable: true,
            },
        );
        self.name_listeners
            .insert(participant, source.subscribe_names());

        let video = source.video_surface();
        match allocator.assign(participant, &source.display_name(), video.as_ref()) {
            Ok(Some(slot)) => {
                info!(slot, "participant displayed");
                JoinOutcome::Displayed(slot)
            }
            Ok(None) => {
                debug!(
                    capacity = allocator.capacity(),
                    "slot pool full, participant waiting"
                );
                JoinOutcome::Waiting
            }
            Err(e) => {
                error!(error = %e, "slot creation failed, rolling back join");
                self.roster.remove(&participant);
                self.name_listeners.remove(&participant);
                JoinOutcome::Rejected
            }
        }
    }

    /// Stop tracking a participant and release its slot
    ///
    /// Returns false if the participant was not tracked.
    #[instrument(skip(self, allocator), fields(participant = %participant))]
    pub fn on_participant_left(
        &mut self,
        participant: ParticipantId,
        allocator: &mut SlotAllocator,
    ) -> bool {
        if self.roster.remove(&participant).is_none() {
            debug!("leave ignored, not tracked");
            return false;
        }
        self.name_listeners.remove(&participant);

        let freed = allocator.reclaim(participant);
        info!(freed, "participant left");

        self.fill_free_slots(allocator);
        true
    }

    /// Promote waiting participants into free slots under
    /// [`ReassignPolicy::JoinOrder`]
    fn fill_free_slots(&mut self, allocator: &mut SlotAllocator) {
        if self.reassign != ReassignPolicy::JoinOrder || allocator.is_full() {
            return;
        }
        if self.roster.len() > allocator.bound_count() {
            self.promote_waiting(allocator);
        }
    }

    /// Give free slots to waiting participants in join order
    ///
    /// Participants whose source is currently unreachable are skipped and
    /// stay waiting. Returns the participants promoted with their slots.
    pub fn promote_waiting(&mut self, allocator: &mut SlotAllocator) -> Vec<(ParticipantId, usize)> {
        let mut promoted = Vec::new();
        for participant in self.waiting(allocator) {
            if allocator.is_full() {
                break;
            }
            let Some(source) = self.resolve_source(participant) else {
                debug!(participant = %participant, "waiting participant unreachable, skipped");
                continue;
            };
            let video = source.video_surface();
            match allocator.assign(participant, &source.display_name(), video.as_ref()) {
                Ok(Some(slot)) => {
                    info!(participant = %participant, slot, "waiting participant promoted");
                    promoted.push((participant, slot));
                }
                Ok(None) => break,
                Err(e) => {
                    error!(participant = %participant, error = %e, "slot creation failed during promotion");
                    break;
                }
            }
        }
        promoted
    }

    /// Current source for a tracked participant
    ///
    /// Falls back to a fresh registry lookup when the cached source is gone
    /// and caches the result. Returns `None` for untracked participants and
    /// for sources that are currently unreachable.
    pub fn resolve_source(&mut self, participant: ParticipantId) -> Option<Arc<dyn ParticipantSource>> {
        let entry = self.roster.get_mut(&participant)?;
        if let Some(source) = entry.source.upgrade() {
            return Some(source);
        }

        match self.registry.lookup(participant) {
            Some(source) => {
                entry.source = Arc::downgrade(&source);
                if !entry.reachable {
                    info!(participant = %participant, "source reachable again");
                }
                entry.reachable = true;
                self.name_listeners
                    .insert(participant, source.subscribe_names());
                Some(source)
            }
            None => {
                if entry.reachable {
                    warn!(participant = %participant, "source unreachable");
                }
                entry.reachable = false;
                None
            }
        }
    }

    /// Collect pending name changes from every participant's listener
    pub fn drain_name_changes(&mut self) -> Vec<(ParticipantId, String)> {
        let mut changes = Vec::new();
        for (participant, listener) in self.name_listeners.iter_mut() {
            for name in listener.drain() {
                changes.push((*participant, name));
            }
        }
        changes
    }

    /// Tracked participants without a slot, in join order
    pub fn waiting(&self, allocator: &SlotAllocator) -> Vec<ParticipantId> {
        let mut waiting: Vec<(u64, ParticipantId)> = self
            .roster
            .iter()
            .filter(|(participant, _)| !allocator.is_assigned(**participant))
            .map(|(participant, tracked)| (tracked.join_seq, *participant))
            .collect();
        waiting.sort_unstable();
        waiting.into_iter().map(|(_, participant)| participant).collect()
    }

    /// Whether a participant is tracked
    pub fn is_tracked(&self, participant: ParticipantId) -> bool {
        self.roster.contains_key(&participant)
    }

    /// Number of tracked participants
    pub fn tracked_count(&self) -> usize {
        self.roster.len()
    }

    /// Tracked participants in join order
    pub fn tracked(&self) -> Vec<ParticipantId> {
        let mut tracked: Vec<(u64, ParticipantId)> = self
            .roster
            .iter()
            .map(|(participant, entry)| (entry.join_seq, *participant))
            .collect();
        tracked.sort_unstable();
        tracked.into_iter().map(|(_, participant)| participant).collect()
    }

    /// Number of name listeners currently held
    pub fn name_listener_count(&self) -> usize {
        self.name_listeners.len()
    }
}
