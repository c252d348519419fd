//! Progress bars for fan-out phases

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Counts finished tasks of one phase
#[derive(Clone)]
pub struct ProgressTracker {
    bar: ProgressBar,
}

impl ProgressTracker {
    pub fn new(total: u64, hidden: bool, label: &str) -> Self {
        let bar = if hidden {
            ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::hidden())
        } else {
            ProgressBar::new(total)
        };

        let style = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {prefix} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");

        bar.set_style(style);
        bar.set_prefix(label.to_string());
        if !hidden {
            bar.enable_steady_tick(Duration::from_millis(120));
        }

        Self { bar }
    }

    /// A tracker that never draws
    pub fn hidden(total: u64) -> Self {
        Self::new(total, true, "")
    }

    pub fn inc(&self) {
        self.bar.inc(1);
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
