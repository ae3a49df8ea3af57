//! Progress indicators, hidden under `--quiet`

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Bar counting archive entries as they are read or written
pub fn entry_bar(total: u64, action: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::with_template("{msg} [{bar:32}] {pos}/{len} entries") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar.set_message(action.to_string());
    bar
}

/// Spinner for one long step over a whole image, such as diffing or patching
pub fn step_spinner(step: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} ({elapsed})") {
        spinner.set_style(style);
    }
    spinner.set_message(step.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}
