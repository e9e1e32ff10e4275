//! Activity Tracker - real-time desktop activity tracking.
//!
//! This library continuously samples the foreground application/window,
//! classifies each sample into a productivity category via ordered rule
//! tables, persists a de-duplicated time-series log as CSV, and streams
//! live updates to any number of WebSocket subscribers.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Activity Tracker                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────┐   ┌────────────┐   ┌───────┐   ┌────────────┐  │
//! │  │  Probe  │──▶│ Categorizer│──▶│ Dedup │──▶│  CSV Log   │  │
//! │  └─────────┘   └────────────┘   └───────┘   └────────────┘  │
//! │       ▲                                            │        │
//! │       │ tick (every 2s)                            ▼        │
//! │  ┌─────────┐        ┌──────────────┐      ┌────────────┐    │
//! │  │ Sampler │───────▶│ BroadcastHub │◀─────│ Aggregation│    │
//! │  └─────────┘        └──────────────┘      └────────────┘    │
//! │                            │                                │
//! │                            ▼                                │
//! │                  WebSocket subscribers                      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The sampler owns the dedup state and is the log's single writer; the
//! shared pause/status/subscriber state lives behind one mutex in
//! [`TrackerState`], injected into both the sampler and the HTTP handlers.

pub mod aggregate;
pub mod categorizer;
pub mod config;
pub mod dedup;
pub mod hub;
pub mod log;
pub mod probe;
pub mod report;
pub mod sampler;
pub mod server;
pub mod state;

// Re-export key types at crate root for convenience
pub use aggregate::{format_hms, AggregationService};
pub use categorizer::{categorize, CategoryRuleTable, Rule};
pub use config::{Config, ConfigError};
pub use dedup::DedupTracker;
pub use hub::{BroadcastHub, CategoryTime, Update};
pub use log::{ActivitySample, CsvLog, LogError, PersistentLog};
pub use probe::{default_probe, ProbeError, WindowInfo, WindowProbe};
pub use sampler::{Sampler, DEFAULT_CHECK_INTERVAL_SECS};
pub use state::{StatusSnapshot, TrackerState};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
