//! On-demand aggregation of time-per-category from the persistent log.
//!
//! The log stores discrete transition events, not elapsed spans, so duration
//! accounting attributes one fixed sampling interval to each recorded row
//! and sums per category. This undercounts when an unchanged activity spans
//! many ticks after its single deduplicated row; the counting rule is kept
//! for parity with the log format.

use crate::log::PersistentLog;
use std::sync::Arc;
use std::time::Duration;

/// Computes total time per category by scanning the log.
pub struct AggregationService {
    log: Arc<dyn PersistentLog>,
    interval: Duration,
}

impl AggregationService {
    pub fn new(log: Arc<dyn PersistentLog>, interval: Duration) -> Self {
        Self { log, interval }
    }

    /// Total accumulated duration per category, sorted by duration
    /// descending. Ties keep first-encountered scan order (stable sort).
    /// An absent or unreadable log yields an empty aggregation.
    pub fn aggregate(&self) -> Vec<(String, Duration)> {
        let samples = match self.log.read_all() {
            Ok(samples) => samples,
            Err(e) => {
                tracing::warn!("Could not read activity log for aggregation: {e}");
                return Vec::new();
            }
        };

        // Linear scan into a Vec keeps first-seen insertion order for the
        // stable tie-break; the log is small for a single-user tool.
        let mut totals: Vec<(String, Duration)> = Vec::new();
        for sample in samples {
            match totals.iter_mut().find(|(cat, _)| *cat == sample.category) {
                Some((_, total)) => *total += self.interval,
                None => totals.push((sample.category, self.interval)),
            }
        }

        totals.sort_by(|a, b| b.1.cmp(&a.1));
        totals
    }
}

/// Format a duration as zero-padded `HH:MM:SS` from total seconds.
pub fn format_hms(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
