//! Suppression of consecutive identical observations.
//!
//! The tracker samples every couple of seconds, but long stretches of
//! unchanged activity should produce a single log row, not one per tick.
//! The dedup tracker holds the last emitted (app, title, category) triple
//! and answers whether the current observation differs from it.

/// Tracks the last emitted observation. Owned exclusively by the sampler
/// thread; never shared, needs no lock.
#[derive(Debug, Default)]
pub struct DedupTracker {
    last: Option<(String, String, String)>,
}

impl DedupTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the observation differs from the last emitted one
    /// (the very first call always emits), updating the stored triple as a
    /// side effect of returning true.
    pub fn should_emit(&mut self, app_name: &str, window_title: &str, category: &str) -> bool {
        let changed = match &self.last {
            Some((app, title, cat)) => {
                app != app_name || title != window_title || cat != category
            }
            None => true,
        };

        if changed {
            self.last = Some((
                app_name.to_string(),
                window_title.to_string(),
                category.to_string(),
            ));
        }
        changed
    }
}
