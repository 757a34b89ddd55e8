use folder_scanner_core::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const PROGRESS_SCALE: u64 = 1000;

/// CLI progress reporter using indicatif.
///
/// - Walks: spinner with the latest status line
/// - Replication and hashing: bar driven by the reported fraction
pub struct CliReporter {
    bar: ProgressBar,
    status_batch: usize,
}

impl CliReporter {
    pub fn new(status_batch: usize) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(spinner_style());
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar, status_batch }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressReporter for CliReporter {
    fn report_status(&self, text: &str) {
        self.bar.set_message(text.to_string());
    }

    fn report_progress(&self, fraction: f64) {
        if self.bar.length() != Some(PROGRESS_SCALE) {
            self.bar.set_length(PROGRESS_SCALE);
            self.bar.set_style(bar_style());
        }
        let position = (fraction.clamp(0.0, 1.0) * PROGRESS_SCALE as f64).round() as u64;
        self.bar.set_position(position);
    }

    fn status_batch(&self) -> usize {
        self.status_batch
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("  {spinner:.cyan} [{bar:30.cyan/dim}] {percent}% {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━╸─")
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
}
