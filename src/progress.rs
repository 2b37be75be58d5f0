//! Progress bar display for acquisition jobs and long operations

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::acquire::{AcquisitionReport, ItemStatus};

/// Progress display for a running job
pub struct ProgressDisplay {
    bar: ProgressBar,
}

impl ProgressDisplay {
    /// Bar over `total_bundles` items
    pub fn new(total_bundles: u64) -> Self {
        let style = ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");

        let bar = ProgressBar::new(total_bundles);
        bar.set_style(style);
        Self { bar }
    }

    /// Spinner for operations without item counts
    pub fn spinner(message: &str) -> Self {
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());

        let bar = ProgressBar::new_spinner();
        bar.set_style(style);
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// Reflect a job report snapshot
    pub fn update(&self, report: &AcquisitionReport) {
        self.bar.set_position(report.finished() as u64);

        let running: Vec<&str> = report
            .items
            .iter()
            .filter(|i| matches!(i.status, ItemStatus::Running { .. }))
            .map(|i| i.bundle.as_str())
            .collect();
        self.bar.set_message(truncate(&running.join(", "), 50));
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    /// Abandon on error
    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

/// Keep the tail of long messages
fn truncate(message: &str, max: usize) -> String {
    let chars: Vec<char> = message.chars().collect();
    if chars.len() <= max {
        return message.to_string();
    }
    let tail: String = chars[chars.len() - (max - 3)..].iter().collect();
    format!("...{tail}")
}
