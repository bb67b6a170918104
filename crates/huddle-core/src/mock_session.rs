//! Mock session layer for testing
//!
//! Provides an in-memory [`SessionRegistry`] whose participants can be
//! connected, renamed, muted, given video, and made unreachable on demand,
//! plus a [`MockSlotFactory`] that counts live render targets.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use huddle_core::{MockSession, ParticipantId, SessionRegistry};
//!
//! let session = MockSession::new();
//! let mut events = session.subscribe();
//!
//! session.connect(ParticipantId(1), "Ada");
//! session.set_amplitude(ParticipantId(1), 0.4);
//!
//! assert!(events.try_next().unwrap().is_join());
//! assert!(session.lookup(ParticipantId(1)).is_some());
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use crate::error::SlotError;
use crate::event::{Broadcaster, SessionEvent, Subscription};
use crate::identity::ParticipantId;
use crate::traits::{ParticipantSource, RenderTarget, SessionRegistry, SlotFactory};
use crate::video::{SurfaceDescriptor, VideoSurfaceHandle};

/// Observable state of a mock participant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticipantState {
    pub name: String,
    pub amplitude: f32,
    pub muted: bool,
    pub video: Option<VideoSurfaceHandle>,
}

/// A mock participant source
///
/// Live values are read under a lock so tests can change them between ticks.
#[derive(Debug)]
pub struct MockParticipant {
    id: ParticipantId,
    state: Mutex<ParticipantState>,
    names: Broadcaster<String>,
}

impl MockParticipant {
    fn new(id: ParticipantId, state: ParticipantState) -> Self {
        Self {
            id,
            state: Mutex::new(state),
            names: Broadcaster::new(),
        }
    }

    /// The participant this source belongs to
    pub fn id(&self) -> ParticipantId {
        self.id
    }

    /// Snapshot of the current state
    pub fn state(&self) -> ParticipantState {
        self.state.lock().clone()
    }

    /// Number of live name-change listeners
    pub fn name_listener_count(&self) -> usize {
        self.names.listener_count()
    }
}

impl ParticipantSource for MockParticipant {
    fn amplitude(&self) -> f32 {
        self.state.lock().amplitude
    }

    fn is_muted(&self) -> bool {
        self.state.lock().muted
    }

    fn display_name(&self) -> String {
        self.state.lock().name.clone()
    }

    fn video_surface(&self) -> Option<VideoSurfaceHandle> {
        self.state.lock().video.clone()
    }

    fn subscribe_names(&self) -> Subscription<String> {
        self.names.subscribe()
    }
}

#[derive(Debug, Default)]
struct SessionState {
    /// Connected participants in connection order
    connected: Vec<ParticipantId>,
    /// Reachable sources (the only strong references the session keeps)
    sources: HashMap<ParticipantId, Arc<MockParticipant>>,
    /// State of connected participants whose source is currently unreachable
    parked: HashMap<ParticipantId, ParticipantState>,
}

/// An in-memory session registry
#[derive(Debug)]
pub struct MockSession {
    state: Mutex<SessionState>,
    events: Broadcaster<SessionEvent>,
    descriptor: SurfaceDescriptor,
    next_surface_id: AtomicU64,
}

impl Default for MockSession {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSession {
    /// Create an empty session
    pub fn new() -> Self {
        Self::with_descriptor(SurfaceDescriptor::default())
    }

    /// Create an empty session whose video surfaces use `descriptor`
    pub fn with_descriptor(descriptor: SurfaceDescriptor) -> Self {
        Self {
            state: Mutex::new(SessionState::default()),
            events: Broadcaster::new(),
            descriptor,
            next_surface_id: AtomicU64::new(1),
        }
    }

    /// Connect a participant with a spawned source and announce the join
    pub fn connect(&self, id: ParticipantId, name: impl Into<String>) {
        let participant_state = ParticipantState {
            name: name.into(),
            ..Default::default()
        };
        {
            let mut state = self.state.lock();
            if !state.connected.contains(&id) {
                state.connected.push(id);
            }
            state.parked.remove(&id);
            state
                .sources
                .insert(id, Arc::new(MockParticipant::new(id, participant_state)));
        }
        debug!(participant = %id, "mock participant connected");
        self.events.publish(SessionEvent::joined(id));
    }

    /// Announce a join whose source has not been spawned yet
    pub fn connect_unspawned(&self, id: ParticipantId) {
        {
            let mut state = self.state.lock();
            if !state.connected.contains(&id) {
                state.connected.push(id);
            }
            state.sources.remove(&id);
            state.parked.insert(id, ParticipantState::default());
        }
        self.events.publish(SessionEvent::joined(id));
    }

    /// Disconnect a participant, destroy its source and announce the leave
    pub fn disconnect(&self, id: ParticipantId) -> bool {
        let removed = {
            let mut state = self.state.lock();
            let was_connected = state.connected.contains(&id);
            state.connected.retain(|c| *c != id);
            state.sources.remove(&id);
            state.parked.remove(&id);
            was_connected
        };
        if removed {
            debug!(participant = %id, "mock participant disconnected");
            self.events.publish(SessionEvent::left(id));
        }
        removed
    }

    /// Destroy a participant's source without any leave event
    pub fn make_unreachable(&self, id: ParticipantId) -> bool {
        let mut state = self.state.lock();
        match state.sources.remove(&id) {
            Some(source) => {
                let snapshot = source.state();
                state.parked.insert(id, snapshot);
                true
            }
            None => false,
        }
    }

    /// Respawn the source of a connected participant
    ///
    /// The new source is a fresh object carrying the last known state.
    pub fn restore(&self, id: ParticipantId) -> bool {
        let mut state = self.state.lock();
        match state.parked.remove(&id) {
            Some(snapshot) => {
                state
                    .sources
                    .insert(id, Arc::new(MockParticipant::new(id, snapshot)));
                true
            }
            None => false,
        }
    }

    /// Set a participant's voice amplitude
    pub fn set_amplitude(&self, id: ParticipantId, amplitude: f32) {
        self.update(id, |p| p.amplitude = amplitude);
    }

    /// Set a participant's self-mute flag
    pub fn set_muted(&self, id: ParticipantId, muted: bool) {
        self.update(id, |p| p.muted = muted);
    }

    /// Change a participant's name and notify name listeners
    pub fn rename(&self, id: ParticipantId, name: impl Into<String>) {
        let name = name.into();
        self.update(id, |p| p.name = name.clone());
        let source = self.state.lock().sources.get(&id).cloned();
        if let Some(source) = source {
            source.names.publish(name);
        }
    }

    /// Produce a video surface for a participant
    pub fn spawn_video(&self, id: ParticipantId) -> Option<VideoSurfaceHandle> {
        let surface_id = self.next_surface_id.fetch_add(1, Ordering::Relaxed);
        let handle = self.descriptor.handle_for(id, surface_id);
        let mut applied = false;
        self.update(id, |p| {
            p.video = Some(handle.clone());
            applied = true;
        });
        applied.then_some(handle)
    }

    /// Release a participant's video surface
    pub fn despawn_video(&self, id: ParticipantId) {
        self.update(id, |p| p.video = None);
    }

    /// Number of live session event listeners
    pub fn listener_count(&self) -> usize {
        self.events.listener_count()
    }

    /// Number of live name listeners on a participant's current source
    pub fn name_listener_count(&self, id: ParticipantId) -> usize {
        self.state
            .lock()
            .sources
            .get(&id)
            .map(|source| source.name_listener_count())
            .unwrap_or(0)
    }

    /// Total name listeners across every reachable source
    pub fn total_name_listeners(&self) -> usize {
        self.state
            .lock()
            .sources
            .values()
            .map(|source| source.name_listener_count())
            .sum()
    }

    /// Number of connected participants
    pub fn connected_count(&self) -> usize {
        self.state.lock().connected.len()
    }

    fn update(&self, id: ParticipantId, f: impl FnOnce(&mut ParticipantState)) {
        let mut state = self.state.lock();
        if let Some(source) = state.sources.get(&id) {
            f(&mut source.state.lock());
        } else if let Some(parked) = state.parked.get_mut(&id) {
            f(parked);
        }
    }
}

impl SessionRegistry for MockSession {
    fn list_connected(&self) -> Vec<ParticipantId> {
        self.state.lock().connected.clone()
    }

    fn lookup(&self, id: ParticipantId) -> Option<Arc<dyn ParticipantSource>> {
        self.state
            .lock()
            .sources
            .get(&id)
            .map(|source| Arc::clone(source) as Arc<dyn ParticipantSource>)
    }

    fn subscribe(&self) -> Subscription<SessionEvent> {
        self.events.subscribe()
    }

    fn is_connected(&self, id: ParticipantId) -> bool {
        self.state.lock().connected.contains(&id)
    }
}

/// Counters shared between a [`MockSlotFactory`] and the test observing it
#[derive(Debug, Default)]
pub struct RenderStats {
    live: AtomicUsize,
    created: AtomicUsize,
    attaches: AtomicUsize,
    detaches: AtomicUsize,
    fail_remaining: AtomicUsize,
}

impl RenderStats {
    /// Render targets currently alive
    pub fn live(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Render targets ever created
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Acquire)
    }

    /// Total attach calls across all targets
    pub fn attaches(&self) -> usize {
        self.attaches.load(Ordering::Acquire)
    }

    /// Total detach calls across all targets
    pub fn detaches(&self) -> usize {
        self.detaches.load(Ordering::Acquire)
    }

    /// Make the next `count` instantiations fail
    pub fn fail_next(&self, count: usize) {
        self.fail_remaining.store(count, Ordering::Release);
    }

    fn take_failure(&self) -> bool {
        self.fail_remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// A slot factory producing counted in-memory render targets
#[derive(Debug, Default)]
pub struct MockSlotFactory {
    stats: Arc<RenderStats>,
}

impl MockSlotFactory {
    /// Create a factory with fresh counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared counters, usable after the factory is handed to a panel
    pub fn stats(&self) -> Arc<RenderStats> {
        Arc::clone(&self.stats)
    }
}

impl SlotFactory for MockSlotFactory {
    fn instantiate(&mut self, index: usize) -> Result<Box<dyn RenderTarget>, SlotError> {
        if self.stats.take_failure() {
            return Err(SlotError::MissingComponent(format!(
                "render target for slot {}",
                index
            )));
        }
        self.stats.created.fetch_add(1, Ordering::AcqRel);
        self.stats.live.fetch_add(1, Ordering::AcqRel);
        Ok(Box::new(MockRenderTarget {
            index,
            surface: None,
            stats: Arc::clone(&self.stats),
        }))
    }
}

/// A render target that records what it shows
#[derive(Debug)]
pub struct MockRenderTarget {
    index: usize,
    surface: Option<VideoSurfaceHandle>,
    stats: Arc<RenderStats>,
}

impl MockRenderTarget {
    /// Slot index this target was created for
    pub fn index(&self) -> usize {
        self.index
    }

    /// Surface currently shown
    pub fn surface(&self) -> Option<&VideoSurfaceHandle> {
        self.surface.as_ref()
    }
}

impl RenderTarget for MockRenderTarget {
    fn attach(&mut self, surface: &VideoSurfaceHandle) {
        self.surface = Some(surface.clone());
        self.stats.attaches.fetch_add(1, Ordering::AcqRel);
    }

    fn detach(&mut self) {
        self.surface = None;
        self.stats.detaches.fetch_add(1, Ordering::AcqRel);
    }
}

impl Drop for MockRenderTarget {
    fn drop(&mut self) {
        let prev = self.stats.live.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(prev >= 1, "MockRenderTarget underflow");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_and_lookup() {
        let session = MockSession::new();
        let mut events = session.subscribe();
        let id = ParticipantId(1);

        session.connect(id, "Ada");
        assert!(session.is_connected(id));
        assert_eq!(session.list_connected(), vec![id]);

        let source = session.lookup(id).unwrap();
        assert_eq!(source.display_name(), "Ada");
        assert!(!source.is_muted());

        let event = events.try_next().unwrap();
        assert!(event.is_join());
        assert_eq!(event.participant(), id);
    }

    #[test]
    fn test_live_values_visible_through_source() {
        let session = MockSession::new();
        let id = ParticipantId(2);
        session.connect(id, "Bo");
        let source = session.lookup(id).unwrap();

        session.set_amplitude(id, 0.6);
        session.set_muted(id, true);
        assert!((source.amplitude() - 0.6).abs() < f32::EPSILON);
        assert!(source.is_muted());

        assert!(source.video_surface().is_none());
        let handle = session.spawn_video(id).unwrap();
        assert_eq!(source.video_surface(), Some(handle));
    }

    #[test]
    fn test_unreachable_source_drops_weak_refs() {
        let session = MockSession::new();
        let id = ParticipantId(3);
        session.connect(id, "Cy");
        session.set_amplitude(id, 0.3);

        let weak = Arc::downgrade(&session.lookup(id).unwrap());
        assert!(weak.upgrade().is_some());

        assert!(session.make_unreachable(id));
        assert!(weak.upgrade().is_none());
        assert!(session.lookup(id).is_none());
        assert!(session.is_connected(id));

        assert!(session.restore(id));
        let source = session.lookup(id).unwrap();
        assert!((source.amplitude() - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn test_rename_notifies_listeners() {
        let session = MockSession::new();
        let id = ParticipantId(4);
        session.connect(id, "");
        let mut names = session.lookup(id).unwrap().subscribe_names();
        assert_eq!(session.name_listener_count(id), 1);

        session.rename(id, "Dee");
        assert_eq!(names.drain(), vec!["Dee".to_string()]);

        drop(names);
        assert_eq!(session.name_listener_count(id), 0);
    }

    #[test]
    fn test_disconnect_announces_leave() {
        let session = MockSession::new();
        let id = ParticipantId(5);
        session.connect(id, "Eve");
        let mut events = session.subscribe();

        assert!(session.disconnect(id));
        assert!(!session.disconnect(id));
        let event = events.try_next().unwrap();
        assert!(!event.is_join());
        assert!(events.try_next().is_none());
    }

    #[test]
    fn test_factory_counts_and_failures() {
        let mut factory = MockSlotFactory::new();
        let stats = factory.stats();

        let mut target = factory.instantiate(0).unwrap();
        assert_eq!(stats.live(), 1);
        target.attach(&SurfaceDescriptor::default().handle_for(ParticipantId(1), 1));
        target.detach();
        assert_eq!(stats.attaches(), 1);
        assert_eq!(stats.detaches(), 1);

        stats.fail_next(1);
        assert!(factory.instantiate(1).is_err());
        assert!(factory.instantiate(1).is_ok());
        assert_eq!(stats.created(), 2);
        assert_eq!(stats.live(), 1);

        drop(target);
        assert_eq!(stats.live(), 0);
    }
}
