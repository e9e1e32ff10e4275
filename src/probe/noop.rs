//! Non-macOS (noop) probe implementation.
//!
//! This exists so the crate (and binary) can compile on platforms without a
//! foreground-window query. It reports nothing, which the sampler records
//! under the Unknown sentinels.

use crate::probe::types::{ProbeError, WindowInfo, WindowProbe};

/// A probe that never observes a foreground window.
pub struct NoopProbe;

impl NoopProbe {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoopProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowProbe for NoopProbe {
    fn probe(&self) -> Result<WindowInfo, ProbeError> {
        Ok(WindowInfo {
            app_name: String::new(),
            window_title: String::new(),
        })
    }
}
