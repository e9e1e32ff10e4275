//! The polling loop: probe, categorize, dedup, persist, notify.
//!
//! The sampler runs on its own thread on a fixed-interval schedule,
//! independent of request handling. Pause is cooperative (the flag is
//! checked once per tick under the state guard) and so is shutdown: pacing
//! is a `recv_timeout` on the shutdown channel, so a stop signal interrupts
//! the sleep instead of waiting out a full interval. No failure during a
//! tick ever terminates the loop.

use crate::categorizer::{categorize, CategoryRuleTable};
use crate::dedup::DedupTracker;
use crate::hub::BroadcastHub;
use crate::log::{ActivitySample, PersistentLog};
use crate::probe::{WindowInfo, WindowProbe};
use crate::state::TrackerState;
use chrono::Utc;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

/// Default seconds between ticks.
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 2;

/// Drives the sampling loop. Owns the dedup state exclusively.
pub struct Sampler {
    probe: Box<dyn WindowProbe>,
    rules: CategoryRuleTable,
    log: Arc<dyn PersistentLog>,
    state: Arc<TrackerState>,
    hub: Arc<BroadcastHub>,
    dedup: DedupTracker,
    interval: Duration,
}

impl Sampler {
    pub fn new(
        probe: Box<dyn WindowProbe>,
        rules: CategoryRuleTable,
        log: Arc<dyn PersistentLog>,
        state: Arc<TrackerState>,
        hub: Arc<BroadcastHub>,
        interval: Duration,
    ) -> Self {
        Self {
            probe,
            rules,
            log,
            state,
            hub,
            dedup: DedupTracker::new(),
            interval,
        }
    }

    /// Run ticks until the shutdown channel fires or closes. The loop never
    /// terminates on its own.
    pub fn run(mut self, shutdown: Receiver<()>) {
        if let Err(e) = self.log.initialize() {
            tracing::warn!("Could not initialize activity log: {e}");
        }
        tracing::info!("Sampling loop started (interval {:?})", self.interval);

        loop {
            self.tick();

            match shutdown.recv_timeout(self.interval) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        tracing::info!("Sampling loop stopped");
    }

    /// One iteration: check pause, probe, categorize, dedup, persist,
    /// notify. Every failure path logs and returns; none aborts the loop.
    pub fn tick(&mut self) {
        if self.state.is_paused() {
            return;
        }

        let info = match self.probe.probe() {
            Ok(info) if info.app_name.is_empty() => WindowInfo {
                app_name: "Unknown".to_string(),
                window_title: "Unknown".to_string(),
            },
            Ok(info) => info,
            Err(e) => {
                tracing::warn!("Window probe failed: {e}");
                WindowInfo {
                    app_name: "Error".to_string(),
                    window_title: "Error".to_string(),
                }
            }
        };

        let category = categorize(&info.app_name, &info.window_title, &self.rules);

        if !self
            .dedup
            .should_emit(&info.app_name, &info.window_title, &category)
        {
            return;
        }

        let sample = ActivitySample {
            timestamp: Utc::now(),
            app_name: info.app_name,
            window_title: info.window_title,
            category,
        };

        if let Err(e) = self.log.append(&sample) {
            // Best-effort persistence: keep ticking, retry next transition.
            tracing::warn!("Could not append activity sample: {e}");
        }
        self.state.mark_activity(sample.timestamp);
        self.hub.notify_update();

        tracing::debug!(
            app = %sample.app_name,
            category = %sample.category,
            "Activity transition recorded"
        );
    }
}
