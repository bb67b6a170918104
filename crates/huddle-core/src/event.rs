//! Session events and subscriptions
//!
//! Events flow from the session layer into the roster through unbounded
//! channels. The publisher side is a [`Broadcaster`]; every listener holds a
//! [`Subscription`]. Dropping a subscription closes its channel, and the
//! broadcaster prunes closed listeners on the next publish, so unsubscribing
//! is just letting the handle go out of scope.
//!
//! Receivers are drained with `try_recv`, which needs no async runtime: the
//! roster pulls queued events at a well-defined point of its tick.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::identity::ParticipantId;

/// Participant state changes reported by the session layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// A participant connected
    Joined {
        participant: ParticipantId,
        timestamp: DateTime<Utc>,
    },

    /// A participant disconnected
    Left {
        participant: ParticipantId,
        timestamp: DateTime<Utc>,
    },
}

impl SessionEvent {
    /// Create a joined event
    pub fn joined(participant: ParticipantId) -> Self {
        Self::Joined {
            participant,
            timestamp: Utc::now(),
        }
    }

    /// Create a left event
    pub fn left(participant: ParticipantId) -> Self {
        Self::Left {
            participant,
            timestamp: Utc::now(),
        }
    }

    /// The participant this event concerns
    pub fn participant(&self) -> ParticipantId {
        match self {
            Self::Joined { participant, .. } => *participant,
            Self::Left { participant, .. } => *participant,
        }
    }

    /// Whether this is a join
    pub fn is_join(&self) -> bool {
        matches!(self, Self::Joined { .. })
    }

    /// Get the timestamp of this event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Joined { timestamp, .. } => *timestamp,
            Self::Left { timestamp, .. } => *timestamp,
        }
    }
}

/// Listener half of an event stream
///
/// Dropping the subscription unregisters it.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: mpsc::UnboundedReceiver<T>,
}

impl<T> Subscription<T> {
    /// Take the next queued event, if any
    pub fn try_next(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Take every queued event in arrival order
    pub fn drain(&mut self) -> Vec<T> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Whether the publisher has gone away and nothing is left to read
    pub fn is_closed(&self) -> bool {
        self.rx.is_closed() && self.rx.is_empty()
    }

    /// Number of events waiting to be read
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

/// Publisher half of an event stream with any number of listeners
#[derive(Debug)]
pub struct Broadcaster<T> {
    listeners: Arc<Mutex<Vec<mpsc::UnboundedSender<T>>>>,
}

impl<T> Default for Broadcaster<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Broadcaster<T> {
    fn clone(&self) -> Self {
        Self {
            listeners: Arc::clone(&self.listeners),
        }
    }
}

impl<T> Broadcaster<T> {
    /// Create a broadcaster with no listeners
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register a new listener
    pub fn subscribe(&self) -> Subscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners.lock().push(tx);
        Subscription { rx }
    }

    /// Number of listeners whose subscription is still alive
    pub fn listener_count(&self) -> usize {
        let mut listeners = self.listeners.lock();
        listeners.retain(|tx| !tx.is_closed());
        listeners.len()
    }
}

impl<T: Clone> Broadcaster<T> {
    /// Deliver an event to every live listener
    ///
    /// Returns the number of listeners reached.
    pub fn publish(&self, event: T) -> usize {
        let mut listeners = self.listeners.lock();
        listeners.retain(|tx| tx.send(event.clone()).is_ok());
        listeners.len()
    }
}
