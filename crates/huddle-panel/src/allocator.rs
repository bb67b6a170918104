//! Bounded slot allocation
//!
//! The [`SlotAllocator`] owns every [`ParticipantSlot`] and is the only writer
//! of the participant -> slot assignment. Slots live at fixed positions
//! `0..capacity`; a position is empty until its slot is instantiated through
//! the [`SlotFactory`], and becomes empty again when a slot is destroyed.
//!
//! Assignment always picks the lowest free position, so the panel fills from
//! the top in join order. A full pool never preempts a displayed participant.

use std::collections::HashMap;

use huddle_core::{ParticipantId, SlotFactory, VideoSurfaceHandle};
use tracing::{debug, trace};

use crate::config::PoolPolicy;
use crate::error::PanelResult;
use crate::slot::ParticipantSlot;

/// Owner of the bounded slot pool
pub struct SlotAllocator {
    factory: Box<dyn SlotFactory>,
    pool_policy: PoolPolicy,
    /// Slot per position; `None` when not instantiated (or destroyed)
    slots: Vec<Option<ParticipantSlot>>,
    assignments: HashMap<ParticipantId, usize>,
}

impl std::fmt::Debug for SlotAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotAllocator")
            .field("capacity", &self.slots.len())
            .field("pool_policy", &self.pool_policy)
            .field("assignments", &self.assignments)
            .finish()
    }
}

impl SlotAllocator {
    /// Create an allocator with room for `capacity` simultaneously bound slots
    pub fn new(capacity: usize, pool_policy: PoolPolicy, factory: Box<dyn SlotFactory>) -> Self {
        Self {
            factory,
            pool_policy,
            slots: (0..capacity).map(|_| None).collect(),
            assignments: HashMap::new(),
        }
    }

    /// Instantiate every empty position up front
    ///
    /// Returns the number of slots created. Stops at the first factory error;
    /// slots created before it are kept.
    pub fn prewarm(&mut self) -> PanelResult<usize> {
        let mut created = 0;
        for index in 0..self.slots.len() {
            if self.slots[index].is_none() {
                let target = self.factory.instantiate(index)?;
                self.slots[index] = Some(ParticipantSlot::new(index, target));
                created += 1;
            }
        }
        debug!(created, "slot pool prewarmed");
        Ok(created)
    }

    /// Bind a free slot to `participant`
    ///
    /// Returns `Ok(None)` when the participant already holds a slot or every
    /// slot is bound. A factory failure leaves the allocator unchanged.
    pub fn assign(
        &mut self,
        participant: ParticipantId,
        display_name: &str,
        video: Option<&VideoSurfaceHandle>,
    ) -> PanelResult<Option<usize>> {
        if self.assignments.contains_key(&participant) {
            trace!(participant = %participant, "already assigned");
            return Ok(None);
        }
        let Some(index) = self.lowest_free_position() else {
            trace!(participant = %participant, "slot pool exhausted");
            return Ok(None);
        };

        if self.slots[index].is_none() {
            let target = self.factory.instantiate(index)?;
            self.slots[index] = Some(ParticipantSlot::new(index, target));
        }
        if let Some(slot) = self.slots[index].as_mut() {
            slot.bind(participant, display_name, video);
        }
        self.assignments.insert(participant, index);

        debug!(participant = %participant, slot = index, "slot assigned");
        Ok(Some(index))
    }

    /// Clear and release the slot held by `participant`
    ///
    /// Returns false if the participant holds no slot.
    pub fn reclaim(&mut self, participant: ParticipantId) -> bool {
        let Some(index) = self.assignments.remove(&participant) else {
            return false;
        };

        match self.pool_policy {
            PoolPolicy::Recycle => {
                if let Some(slot) = self.slots[index].as_mut() {
                    slot.clear();
                }
            }
            PoolPolicy::Destroy => {
                if let Some(mut slot) = self.slots[index].take() {
                    slot.clear();
                }
            }
        }

        debug!(participant = %participant, slot = index, policy = ?self.pool_policy, "slot reclaimed");
        true
    }

    /// Reclaim every bound slot
    ///
    /// Returns the number of slots reclaimed.
    pub fn reclaim_all(&mut self) -> usize {
        let participants: Vec<ParticipantId> = self.assignments.keys().copied().collect();
        participants
            .into_iter()
            .filter(|participant| self.reclaim(*participant))
            .count()
    }

    /// Reclaim every bound slot and destroy every slot, pooled ones included
    pub fn destroy_all(&mut self) {
        self.reclaim_all();
        for position in self.slots.iter_mut() {
            *position = None;
        }
    }

    /// The slot bound to `participant`
    pub fn slot(&self, participant: ParticipantId) -> Option<&ParticipantSlot> {
        let index = *self.assignments.get(&participant)?;
        self.slots[index].as_ref()
    }

    /// Mutable access to the slot bound to `participant` (display fields only)
    pub fn slot_mut(&mut self, participant: ParticipantId) -> Option<&mut ParticipantSlot> {
        let index = *self.assignments.get(&participant)?;
        self.slots[index].as_mut()
    }

    /// The slot at a position, bound or not
    pub fn slot_at(&self, index: usize) -> Option<&ParticipantSlot> {
        self.slots.get(index)?.as_ref()
    }

    /// Every instantiated slot in position order
    pub fn slots(&self) -> impl Iterator<Item = &ParticipantSlot> {
        self.slots.iter().flatten()
    }

    /// Position held by `participant`
    pub fn slot_index(&self, participant: ParticipantId) -> Option<usize> {
        self.assignments.get(&participant).copied()
    }

    /// Whether `participant` holds a slot
    pub fn is_assigned(&self, participant: ParticipantId) -> bool {
        self.assignments.contains_key(&participant)
    }

    /// Participants holding a slot, in position order
    pub fn assigned_ids(&self) -> Vec<ParticipantId> {
        let mut assigned: Vec<(usize, ParticipantId)> = self
            .assignments
            .iter()
            .map(|(participant, index)| (*index, *participant))
            .collect();
        assigned.sort_unstable();
        assigned.into_iter().map(|(_, participant)| participant).collect()
    }

    /// Number of bound slots
    pub fn bound_count(&self) -> usize {
        self.assignments.len()
    }

    /// Maximum number of simultaneously bound slots
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Whether every slot is bound
    pub fn is_full(&self) -> bool {
        self.bound_count() >= self.capacity()
    }

    /// Instantiated slots waiting unbound in the pool
    pub fn pooled_count(&self) -> usize {
        self.slots().filter(|slot| !slot.is_bound()).count()
    }

    /// Instantiated slots, bound or not
    pub fn instantiated_count(&self) -> usize {
        self.slots().count()
    }

    fn lowest_free_position(&self) -> Option<usize> {
        if self.is_full() {
            return None;
        }
        self.slots
            .iter()
            .position(|position| position.as_ref().is_none_or(|slot| !slot.is_bound()))
    }
}
