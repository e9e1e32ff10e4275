//! macOS foreground window probing via AppleScript.
//!
//! The frontmost application name comes from System Events. For supported
//! browsers the active tab URL is probed as well and used as the window
//! title, so rule tables can classify by site.

use crate::probe::types::{ProbeError, WindowInfo, WindowProbe};
use std::process::Command;

/// Browsers whose active tab URL can be queried.
const SUPPORTED_BROWSERS: &[&str] = &["Brave Browser", "Google Chrome", "Safari", "Firefox", "Arc"];

const APP_SCRIPT: &str =
    r#"tell application "System Events" to get name of first process whose frontmost is true"#;

fn url_script(app_name: &str) -> String {
    format!(
        r#"if application "{app_name}" is running then
    tell application "{app_name}"
        if its (count of windows) > 0 then
            try
                get URL of active tab of first window
            on error
                try
                    get URL of active tab of front window
                on error
                    "No URL found"
                end try
            end try
        else
            "No windows open"
        end if
    end tell
else
    "App not running"
end if"#
    )
}

/// Probe backed by `osascript`.
pub struct MacosProbe;

impl MacosProbe {
    pub fn new() -> Self {
        Self
    }

    fn run_osascript(&self, script: &str) -> Result<String, ProbeError> {
        let output = Command::new("osascript")
            .arg("-e")
            .arg(script)
            .output()
            .map_err(|e| ProbeError::Launch(e.to_string()))?;

        if !output.status.success() {
            return Err(ProbeError::Script(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for MacosProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowProbe for MacosProbe {
    fn probe(&self) -> Result<WindowInfo, ProbeError> {
        let app_name = self.run_osascript(APP_SCRIPT)?;
        if app_name.is_empty() {
            return Ok(WindowInfo {
                app_name: String::new(),
                window_title: String::new(),
            });
        }

        let window_title = if SUPPORTED_BROWSERS.contains(&app_name.as_str()) {
            // The URL probe failing is not fatal; fall back to the app name.
            match self.run_osascript(&url_script(&app_name)) {
                Ok(url) if !url.is_empty() && !url.contains("No URL found") => url,
                _ => app_name.clone(),
            }
        } else {
            app_name.clone()
        };

        Ok(WindowInfo {
            app_name,
            window_title,
        })
    }
}
