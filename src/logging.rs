//! Process-wide logging setup
//!
//! Library code only emits `tracing` events. Installing a subscriber is left
//! to the binary (or any embedding application) through [`init`].

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use crate::error::{ErrorCategory, ErrorKind, PbeError, Result};

/// Name of the log file created inside the log directory.
pub const LOG_FILE_NAME: &str = "pbecoder.log";

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is not set, e.g. `warn` or
    /// `pbecoder=debug`.
    pub level: String,
    /// When set, events are also appended to `LOG_FILE_NAME` in this directory.
    pub log_dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            log_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogInit {
    /// This call installed the global subscriber.
    Installed { log_file: Option<PathBuf> },
    /// A global subscriber was already present; nothing was changed.
    AlreadyConfigured,
}

/// Install the global subscriber.
///
/// Only the first successful call in a process takes effect. The global
/// dispatcher is set atomically, so concurrent callers cannot both install
/// one; the losers get [`LogInit::AlreadyConfigured`].
pub fn init(config: &LogConfig) -> Result<LogInit> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| {
            PbeError::with_source(
                ErrorCategory::User,
                format!("invalid log filter '{}'", config.level),
                e,
            )
        })?;

    let (file_layer, log_file) = match &config.log_dir {
        Some(dir) => {
            let (file, path) = open_log_file(dir)?;
            let layer = fmt::layer()
                .with_ansi(false)
                .with_thread_names(true)
                .with_writer(Mutex::new(file));
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .try_init();

    match installed {
        Ok(()) => Ok(LogInit::Installed { log_file }),
        Err(_) => Ok(LogInit::AlreadyConfigured),
    }
}

fn open_log_file(dir: &Path) -> Result<(File, PathBuf)> {
    let path = dir.join(LOG_FILE_NAME);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| {
            PbeError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Io,
                format!("failed to open log file {}", path.display()),
                e,
            )
        })?;
    Ok((file, path))
}
