//! Shared tracker control and status state.
//!
//! One mutex guards the pause flag, last-activity timestamp, and subscriber
//! set. Every read and write goes through the guard so a concurrent status
//! query never observes a torn snapshot, and critical sections hold no I/O.

use crate::hub::Update;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// Consistent snapshot of tracker status, taken under the guard.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub is_paused: bool,
    pub started_at: DateTime<Utc>,
    pub last_activity: Option<DateTime<Utc>>,
    pub connected_clients: usize,
}

struct StateInner {
    is_paused: bool,
    last_activity: Option<DateTime<Utc>>,
    subscribers: HashMap<Uuid, UnboundedSender<Update>>,
}

/// Shared mutable state, injected into both the sampler and the handler
/// layer. Constructed explicitly per instance so tests get fresh state.
pub struct TrackerState {
    started_at: DateTime<Utc>,
    inner: Mutex<StateInner>,
}

impl TrackerState {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            inner: Mutex::new(StateInner {
                is_paused: false,
                last_activity: None,
                subscribers: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StateInner> {
        // A poisoned guard is an invariant violation, not a runtime
        // condition to handle.
        self.inner.lock().expect("tracker state mutex poisoned")
    }

    /// Flip the pause flag and return the value immediately after this
    /// caller's flip. Safe to call concurrently; the guard serializes
    /// callers.
    pub fn toggle_pause(&self) -> bool {
        let mut inner = self.lock();
        inner.is_paused = !inner.is_paused;
        inner.is_paused
    }

    pub fn is_paused(&self) -> bool {
        self.lock().is_paused
    }

    /// Record the timestamp of the latest emitted sample.
    pub fn mark_activity(&self, timestamp: DateTime<Utc>) {
        self.lock().last_activity = Some(timestamp);
    }

    pub fn status(&self) -> StatusSnapshot {
        let inner = self.lock();
        StatusSnapshot {
            is_paused: inner.is_paused,
            started_at: self.started_at,
            last_activity: inner.last_activity,
            connected_clients: inner.subscribers.len(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Register a live-update recipient.
    pub fn subscribe(&self, id: Uuid, sender: UnboundedSender<Update>) {
        self.lock().subscribers.insert(id, sender);
    }

    /// Deregister a recipient. Unknown ids are a no-op.
    pub fn unsubscribe(&self, id: Uuid) {
        self.lock().subscribers.remove(&id);
    }

    /// Push an identical payload to every subscriber, dropping any whose
    /// channel is closed. Delivery is best-effort; one failed push never
    /// blocks the others.
    pub fn broadcast(&self, update: Update) {
        let mut inner = self.lock();
        inner
            .subscribers
            .retain(|id, sender| match sender.send(update.clone()) {
                Ok(()) => true,
                Err(_) => {
                    tracing::debug!("Dropping disconnected subscriber {id}");
                    false
                }
            });
    }
}

impl Default for TrackerState {
    fn default() -> Self {
        Self::new()
    }
}
