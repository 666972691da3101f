//! Log routing for the CLI
//!
//! stderr shows records up to the configured verbosity. An optional log file
//! receives every record the crate emits, each line timestamped.

use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use env_logger::fmt::Formatter;
use log::{LevelFilter, Record};
use timelapse_tile::{Result, Verbosity};

/// Shared between the installed logger and the code configuring it
pub struct LogSink {
    /// Set when `RUST_LOG` drives filtering instead of the verbosity
    env_override: bool,
    stderr_level: Mutex<LevelFilter>,
    file: Mutex<Option<File>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl LogSink {
    fn new(env_override: bool) -> Self {
        Self {
            env_override,
            stderr_level: Mutex::new(Verbosity::Normal.level_filter()),
            file: Mutex::new(None),
        }
    }

    /// Installs env_logger with this sink behind it
    pub fn init() -> Arc<Self> {
        let sink = Arc::new(Self::new(std::env::var_os("RUST_LOG").is_some()));
        let writer = Arc::clone(&sink);

        env_logger::Builder::new()
            .filter_level(LevelFilter::Warn)
            .filter_module("timelapse_tile", LevelFilter::Debug)
            .parse_default_env()
            .format(move |buf, record| writer.write(buf, record))
            .target(env_logger::Target::Stderr)
            .init();

        sink.update_max_level();
        sink
    }

    pub fn set_verbosity(&self, verbosity: Verbosity) {
        *lock(&self.stderr_level) = verbosity.level_filter();
        self.update_max_level();
    }

    /// Appends all further records to `path`
    pub fn attach_file(&self, path: &Path) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                std::io::Error::new(e.kind(), format!("cannot open logfile {}: {e}", path.display()))
            })?;
        *lock(&self.file) = Some(file);
        self.update_max_level();
        Ok(())
    }

    fn has_file(&self) -> bool {
        lock(&self.file).is_some()
    }

    fn wants_stderr(&self, record: &Record) -> bool {
        self.env_override || record.level() <= *lock(&self.stderr_level)
    }

    /// Global cap on what reaches the logger at all
    fn max_level(&self) -> LevelFilter {
        let stderr_level = *lock(&self.stderr_level);
        if self.has_file() {
            stderr_level.max(LevelFilter::Debug)
        } else {
            stderr_level
        }
    }

    fn update_max_level(&self) {
        if !self.env_override {
            log::set_max_level(self.max_level());
        }
    }

    fn write_to_file(&self, timestamp: impl Display, record: &Record) -> std::io::Result<()> {
        if let Some(file) = lock(&self.file).as_mut() {
            writeln!(
                file,
                "{timestamp} {:<5} {}: {}",
                record.level(),
                record.target(),
                record.args()
            )?;
        }
        Ok(())
    }

    fn write(&self, buf: &mut Formatter, record: &Record) -> std::io::Result<()> {
        let timestamp = buf.timestamp();
        self.write_to_file(&timestamp, record)?;
        if self.wants_stderr(record) {
            writeln!(
                buf,
                "[{timestamp} {:<5} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )?;
        }
        Ok(())
    }
}
