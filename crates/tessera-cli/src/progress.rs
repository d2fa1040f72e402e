//! Progress indicators for uploads

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a spinner for operations without visible byte progress
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// A spinner that draws nothing, for quiet or JSON output
pub fn hidden() -> ProgressBar {
    ProgressBar::hidden()
}
