//! Progress bar for tile video downloads

use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use timelapse_tile::ProgressCallback;

const TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {bytes_per_sec}";

/// Creates a byte-counting progress bar on stderr
pub fn create_progress_bar(total_size: u64) -> ProgressBar {
    let pb = ProgressBar::new(total_size);
    let style = ProgressStyle::default_bar()
        .template(TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

/// Drives one progress bar from download callbacks
pub struct ProgressManager {
    pub pb: ProgressBar,
}

impl ProgressManager {
    pub fn new(total_size: u64, message: &str) -> Self {
        eprintln!("{message}");
        Self {
            pb: create_progress_bar(total_size),
        }
    }

    /// Callback for [`timelapse_tile::DownloadOptions::progress`]
    ///
    /// The length is only known once the response arrives, so it is set
    /// from the first callback that carries one.
    pub fn callback(&self) -> ProgressCallback {
        let pb = self.pb.clone();
        Arc::new(move |downloaded, total| {
            if total > 0 && pb.length() != Some(total) {
                pb.set_length(total);
            }
            pb.set_position(downloaded);
        })
    }

    pub fn finish(&self) {
        self.pb.finish_with_message("✅ Tile downloaded");
    }

    pub fn abandon(&self) {
        self.pb.abandon();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_progress_bar() {
        let pb = create_progress_bar(1000);
        assert_eq!(pb.length(), Some(1000));
        pb.set_position(100);
        pb.finish();
    }

    #[test]
    fn test_callback_learns_length() {
        let manager = ProgressManager::new(0, "Test download");
        let callback = manager.callback();

        callback(10, 0);
        assert_eq!(manager.pb.length(), Some(0));
        assert_eq!(manager.pb.position(), 10);

        callback(250, 500);
        assert_eq!(manager.pb.length(), Some(500));
        assert_eq!(manager.pb.position(), 250);
        manager.finish();
        assert!(manager.pb.is_finished());
    }
}
