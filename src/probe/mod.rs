//! Foreground window probing.
//!
//! Platform-specific implementations answer "what application/window/URL is
//! currently frontmost". The sampler only depends on the [`WindowProbe`]
//! trait; probe failure is handled there by substituting sentinel values,
//! never by aborting a tick.

pub mod types;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(not(target_os = "macos"))]
pub mod noop;

pub use types::{ProbeError, WindowInfo, WindowProbe};

#[cfg(target_os = "macos")]
pub use macos::MacosProbe;

/// Platform-agnostic probe type alias
#[cfg(target_os = "macos")]
pub type PlatformProbe = MacosProbe;

#[cfg(not(target_os = "macos"))]
pub use noop::NoopProbe;

/// Platform-agnostic probe type alias
#[cfg(not(target_os = "macos"))]
pub type PlatformProbe = NoopProbe;

/// Probe for the current platform, boxed for injection into the sampler.
pub fn default_probe() -> Box<dyn WindowProbe> {
    Box::new(PlatformProbe::new())
}
