//! Append-only persistent log of activity samples.
//!
//! Samples are stored as CSV rows (`timestamp,app_name,window_title,category`)
//! with a header line. The log is single-writer (only the sampler appends)
//! and each append is a single flushed write, so concurrent readers never
//! observe a torn final record. Malformed or short rows are skipped on read.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;

/// Timestamp format used in the log: sortable, 1-second resolution.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// CSV header written by `initialize`.
const HEADER: &str = "timestamp,app_name,window_title,category";

/// One discrete observation of foreground activity. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySample {
    pub timestamp: DateTime<Utc>,
    pub app_name: String,
    pub window_title: String,
    pub category: String,
}

/// Errors from the persistent log.
#[derive(Debug)]
pub enum LogError {
    Io(String),
}

impl std::fmt::Display for LogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogError::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for LogError {}

impl From<std::io::Error> for LogError {
    fn from(e: std::io::Error) -> Self {
        LogError::Io(e.to_string())
    }
}

/// Durable, append-only store of activity samples.
///
/// Failure semantics: `append` errors are reported to the caller, who logs
/// them and continues; a missing file on `read_all` is an empty log, not an
/// error.
pub trait PersistentLog: Send + Sync {
    /// Create the store with its header if absent; a no-op if it exists.
    fn initialize(&self) -> Result<(), LogError>;

    /// Durably write one record (write-then-flush).
    fn append(&self, sample: &ActivitySample) -> Result<(), LogError>;

    /// Full scan in insertion order, skipping malformed rows.
    fn read_all(&self) -> Result<Vec<ActivitySample>, LogError>;
}

/// CSV-backed persistent log.
#[derive(Debug, Clone)]
pub struct CsvLog {
    path: PathBuf,
}

impl CsvLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl PersistentLog for CsvLog {
    fn initialize(&self) -> Result<(), LogError> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, format!("{HEADER}\n"))?;
        Ok(())
    }

    fn append(&self, sample: &ActivitySample) -> Result<(), LogError> {
        let row = format!(
            "{},{},{},{}\n",
            sample.timestamp.format(TIMESTAMP_FORMAT),
            escape_field(&sample.app_name),
            escape_field(&sample.window_title),
            escape_field(&sample.category),
        );

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        // One write per record, flushed before returning, so a concurrent
        // read_all never sees a partial final row.
        file.write_all(row.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<ActivitySample>, LogError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut samples = Vec::new();
        for line in content.lines() {
            if line.is_empty() || line == HEADER {
                continue;
            }
            let fields = parse_row(line);
            if fields.len() < 4 {
                continue; // malformed row, skip
            }
            let Some(timestamp) = parse_timestamp(&fields[0]) else {
                continue;
            };
            samples.push(ActivitySample {
                timestamp,
                app_name: fields[1].clone(),
                window_title: fields[2].clone(),
                category: fields[3].clone(),
            });
        }
        Ok(samples)
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Quote a CSV field when it contains a delimiter, quote, or newline.
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Split one CSV row into fields, honoring quoted fields with doubled quotes.
fn parse_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
            }
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}
