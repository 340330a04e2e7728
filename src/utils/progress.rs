//! Progress bar utilities

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a standard progress bar with consistent styling
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{msg} [{bar:40.cyan/blue}] {pos:>7}/{len:7} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━━─");
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Bar for a stage fan-out, or a hidden one when progress display is off
pub fn stage_progress_bar(total: usize, message: &str, visible: bool) -> ProgressBar {
    if visible {
        create_progress_bar(total as u64, message)
    } else {
        ProgressBar::hidden()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_progress_bar() {
        let pb = create_progress_bar(100, "Aligning");
        assert_eq!(pb.length(), Some(100));
        pb.finish_and_clear();
    }

    #[test]
    fn test_hidden_bar_still_counts() {
        let pb = stage_progress_bar(3, "Trimming", false);
        pb.inc(2);
        assert_eq!(pb.position(), 2);
        assert!(pb.is_hidden());
    }
}
