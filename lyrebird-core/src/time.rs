//! Time formatting for progress labels.

use std::time::Duration;

/// Extension trait for showing a `Duration` in the UI.
pub trait DurationExt {
    /// Format as a `m:ss` progress label, rounding down to whole seconds.
    fn to_clock_string(&self) -> String;
}

impl DurationExt for Duration {
    fn to_clock_string(&self) -> String {
        let secs = self.as_secs();
        format!("{}:{:02}", secs / 60, secs % 60)
    }
}

/// `position / duration` label; unknown durations show as `--:--`
#[must_use]
pub fn progress_label(position: Duration, duration: Option<Duration>) -> String {
    let total = duration.map_or_else(|| "--:--".to_string(), |d| d.to_clock_string());
    format!("{} / {}", position.to_clock_string(), total)
}
