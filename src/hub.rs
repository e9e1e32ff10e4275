//! Broadcast fan-out of activity and status updates to live subscribers.
//!
//! The hub computes each payload once and pushes it to every registered
//! subscriber channel. Delivery is best-effort, at-most-once: a failed push
//! drops that subscriber without affecting the others, and with zero
//! subscribers no aggregation scan is performed at all.

use crate::aggregate::{format_hms, AggregationService};
use crate::state::{StatusSnapshot, TrackerState};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// One aggregated category entry in an update payload.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryTime {
    pub category: String,
    pub time_str: String,
}

/// Message pushed to subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Update {
    ActivityUpdate {
        timestamp: DateTime<Utc>,
        activities: Vec<CategoryTime>,
        status: StatusSnapshot,
    },
    Shutdown {
        message: String,
    },
}

/// Fans out updates to all currently-registered subscribers.
pub struct BroadcastHub {
    state: Arc<TrackerState>,
    aggregator: AggregationService,
}

impl BroadcastHub {
    pub fn new(state: Arc<TrackerState>, aggregator: AggregationService) -> Self {
        Self { state, aggregator }
    }

    /// Register a subscriber and immediately send it one update payload.
    pub fn subscribe(&self, id: Uuid, sender: UnboundedSender<Update>) {
        self.state.subscribe(id, sender.clone());
        // Registered before the snapshot so the new client sees itself in
        // the connected count.
        let initial = self.build_update();
        if sender.send(initial).is_err() {
            self.state.unsubscribe(id);
        }
    }

    pub fn unsubscribe(&self, id: Uuid) {
        self.state.unsubscribe(id);
    }

    /// Compute the current aggregation and status once and push the
    /// identical payload to every subscriber. With no subscribers this is a
    /// cheap no-op: the log is not scanned.
    pub fn notify_update(&self) {
        if self.state.subscriber_count() == 0 {
            return;
        }
        self.state.broadcast(self.build_update());
    }

    /// Broadcast a shutdown notice to all subscribers.
    pub fn notify_shutdown(&self, message: &str) {
        self.state.broadcast(Update::Shutdown {
            message: message.to_string(),
        });
    }

    /// Current aggregation plus a consistent status snapshot.
    pub fn build_update(&self) -> Update {
        let activities = self
            .aggregator
            .aggregate()
            .into_iter()
            .map(|(category, total)| CategoryTime {
                category,
                time_str: format_hms(total),
            })
            .collect();

        Update::ActivityUpdate {
            timestamp: Utc::now(),
            activities,
            status: self.state.status(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::{ActivitySample, LogError, PersistentLog};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Log double that counts full scans.
    struct CountingLog {
        reads: AtomicUsize,
        samples: Vec<ActivitySample>,
    }

    impl CountingLog {
        fn new(samples: Vec<ActivitySample>) -> Self {
            Self {
                reads: AtomicUsize::new(0),
                samples,
            }
        }
    }

    impl PersistentLog for CountingLog {
        fn initialize(&self) -> Result<(), LogError> {
            Ok(())
        }

        fn append(&self, _sample: &ActivitySample) -> Result<(), LogError> {
            Ok(())
        }

        fn read_all(&self) -> Result<Vec<ActivitySample>, LogError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.samples.clone())
        }
    }

    fn sample(category: &str) -> ActivitySample {
        ActivitySample {
            timestamp: Utc::now(),
            app_name: "App".to_string(),
            window_title: "Title".to_string(),
            category: category.to_string(),
        }
    }

    fn hub_with_counting_log(
        samples: Vec<ActivitySample>,
    ) -> (BroadcastHub, Arc<CountingLog>, Arc<TrackerState>) {
        let log = Arc::new(CountingLog::new(samples));
        let state = Arc::new(TrackerState::new());
        let aggregator = AggregationService::new(
            Arc::clone(&log) as Arc<dyn PersistentLog>,
            Duration::from_secs(2),
        );
        (
            BroadcastHub::new(Arc::clone(&state), aggregator),
            log,
            state,
        )
    }

    #[test]
    fn test_zero_subscriber_notify_skips_aggregation() {
        let (hub, log, _state) = hub_with_counting_log(vec![sample("A")]);

        hub.notify_update();
        hub.notify_update();

        assert_eq!(log.reads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_subscribe_triggers_immediate_update() {
        let (hub, log, state) = hub_with_counting_log(vec![sample("A"), sample("A")]);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        hub.subscribe(Uuid::new_v4(), tx);

        assert_eq!(log.reads.load(Ordering::SeqCst), 1);
        assert_eq!(state.subscriber_count(), 1);
        match rx.try_recv().unwrap() {
            Update::ActivityUpdate { activities, status, .. } => {
                assert_eq!(activities.len(), 1);
                assert_eq!(activities[0].category, "A");
                assert_eq!(activities[0].time_str, "00:00:04");
                assert_eq!(status.connected_clients, 1);
            }
            other => panic!("expected activity update, got {other:?}"),
        }
    }

    #[test]
    fn test_notify_computes_payload_once_for_many_subscribers() {
        let (hub, log, _state) = hub_with_counting_log(vec![sample("A")]);
        let (tx1, mut rx1) = tokio::sync::mpsc::unbounded_channel();
        let (tx2, mut rx2) = tokio::sync::mpsc::unbounded_channel();
        hub.subscribe(Uuid::new_v4(), tx1);
        hub.subscribe(Uuid::new_v4(), tx2);
        let reads_after_subscribe = log.reads.load(Ordering::SeqCst);

        // Drain the initial per-subscriber updates.
        let _ = rx1.try_recv();
        let _ = rx2.try_recv();

        hub.notify_update();

        assert_eq!(log.reads.load(Ordering::SeqCst), reads_after_subscribe + 1);
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn test_failed_subscriber_removed_on_notify() {
        let (hub, _log, state) = hub_with_counting_log(vec![sample("A")]);
        let (live_tx, mut live_rx) = tokio::sync::mpsc::unbounded_channel();
        let (dead_tx, dead_rx) = tokio::sync::mpsc::unbounded_channel();

        hub.subscribe(Uuid::new_v4(), live_tx);
        hub.subscribe(Uuid::new_v4(), dead_tx);
        let _ = live_rx.try_recv();
        drop(dead_rx);

        hub.notify_update();

        assert_eq!(state.subscriber_count(), 1);
        assert!(live_rx.try_recv().is_ok());
    }

    #[test]
    fn test_shutdown_notice_reaches_subscribers() {
        let (hub, _log, _state) = hub_with_counting_log(Vec::new());
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        hub.subscribe(Uuid::new_v4(), tx);
        let _ = rx.try_recv();

        hub.notify_shutdown("Server shutting down");

        match rx.try_recv().unwrap() {
            Update::Shutdown { message } => assert_eq!(message, "Server shutting down"),
            other => panic!("expected shutdown, got {other:?}"),
        }
    }
}
