//! Command-line helpers for timelapse-tile
//!
//! Kept out of the library: log routing, progress bars and terminal output.

pub mod logging;
pub mod progress;

pub use logging::LogSink;
pub use progress::ProgressManager;
