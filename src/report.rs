//! Offline summary report over the activity log.
//!
//! Used by the `report` CLI subcommand: ranks categories by accumulated
//! time, with per-category share percentages and human-readable durations.

use std::time::Duration;

/// Human-readable duration: "2 hour(s), 5 minute(s)"; seconds shown only
/// for sub-minute totals.
pub fn format_human(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{hours} hour(s)"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes} minute(s)"));
    }
    if seconds > 0 && parts.is_empty() {
        parts.push(format!("{seconds} second(s)"));
    }

    if parts.is_empty() {
        "0 seconds".to_string()
    } else {
        parts.join(", ")
    }
}

/// Render the summary report for pre-aggregated category totals.
///
/// The input is expected in the aggregation service's order (longest
/// first); the report preserves it.
pub fn render_report(totals: &[(String, Duration)]) -> String {
    if totals.is_empty() {
        return "No activity data found.".to_string();
    }

    let total_secs: u64 = totals.iter().map(|(_, d)| d.as_secs()).sum();
    let total = Duration::from_secs(total_secs);

    let mut out = String::new();
    out.push_str("Activity Summary Report\n");
    out.push_str(&"=".repeat(50));
    out.push('\n');
    out.push_str(&format!("Total tracking time: {}\n", format_human(total)));
    out.push_str(&format!("Number of categories: {}\n\n", totals.len()));

    for (i, (category, duration)) in totals.iter().enumerate() {
        let percentage = if total_secs > 0 {
            duration.as_secs() as f64 / total_secs as f64 * 100.0
        } else {
            0.0
        };
        out.push_str(&format!(
            "{:2}. {:<30} {:<20} ({percentage:5.1}%)\n",
            i + 1,
            category,
            format_human(*duration),
        ));
    }
    out
}
