//! Probe trait and result types.

/// What the probe observed about the foreground window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowInfo {
    /// Name of the frontmost application. May be empty when the platform
    /// reports nothing; callers substitute sentinels.
    pub app_name: String,
    /// Window title, or the active tab URL for supported browsers.
    pub window_title: String,
}

/// Errors from probing the foreground window.
#[derive(Debug)]
pub enum ProbeError {
    /// The probing command could not be launched.
    Launch(String),
    /// The probing command ran but reported failure.
    Script(String),
}

impl std::fmt::Display for ProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeError::Launch(e) => write!(f, "could not launch probe: {e}"),
            ProbeError::Script(e) => write!(f, "probe script failed: {e}"),
        }
    }
}

impl std::error::Error for ProbeError {}

/// Answers "what is currently foregrounded".
///
/// Implementations are expected to return promptly; a hang is out of
/// contract. Failure is an ordinary outcome the sampler maps to sentinel
/// values.
pub trait WindowProbe: Send {
    fn probe(&self) -> Result<WindowInfo, ProbeError>;
}
