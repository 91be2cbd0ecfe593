//! Progress indicators for dataset generation.
//!
//! Bars are drawn on stderr only when it is an interactive terminal, so
//! piped runs and tests stay quiet.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{IsTerminal, stderr};

/// Check if we should show progress indicators.
#[must_use]
pub fn should_show_progress() -> bool {
    stderr().is_terminal()
}

/// Create a byte-count progress bar.
///
/// # Panics
/// Panics if the progress bar template string is invalid.
#[must_use]
pub fn create_bytes_bar(total_bytes: u64, message: &str, show: bool) -> ProgressBar {
    let pb = ProgressBar::new(total_bytes);

    if show {
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] \
                     {bytes}/{total_bytes} {msg}",
                )
                .expect("valid template")
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
    } else {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }

    pb
}

/// Byte progress bar that draws only on a terminal.
pub struct ProgressTracker {
    bar: ProgressBar,
}

impl ProgressTracker {
    /// Create a tracker for `total_bytes`, visible only on a terminal.
    #[must_use]
    pub fn bytes(total_bytes: u64, message: &str) -> Self {
        Self {
            bar: create_bytes_bar(total_bytes, message, should_show_progress()),
        }
    }

    /// Set the current position.
    pub fn set_position(&self, pos: u64) {
        self.bar.set_position(pos);
    }

    /// Finish and clear the progress bar.
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}
