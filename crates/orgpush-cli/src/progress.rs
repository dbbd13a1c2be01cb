//! Progress indicators for CLI operations
//!
//! Spinners draw to stderr and stay hidden when stderr is not a terminal, so
//! piped output is unaffected.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a spinner for a job that is being waited on
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.green} [{elapsed}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// A spinner, or nothing when JSON output is requested
pub fn maybe_spinner(message: &str, quiet: bool) -> Option<ProgressBar> {
    (!quiet).then(|| create_spinner(message))
}

/// Format bytes into human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}
