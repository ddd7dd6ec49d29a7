//! Application start-up
//!
//! Start-up runs in a fixed order, once, on the thread that owns the
//! returned [`AppContext`]: work directory, then log directory, then the
//! global log subscriber.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::logging::{self, LogConfig, LogInit};
use crate::workdir::WorkDir;

#[derive(Debug, Clone)]
pub struct Bootstrap {
    work_root: Option<PathBuf>,
    log_level: String,
    log_to_file: bool,
}

impl Default for Bootstrap {
    fn default() -> Self {
        Self {
            work_root: None,
            log_level: LogConfig::default().level,
            log_to_file: false,
        }
    }
}

impl Bootstrap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `root` instead of the platform data directory.
    pub fn work_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.work_root = Some(root.into());
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Also append log output to a file in the work directory's log folder.
    pub fn log_to_file(mut self, enabled: bool) -> Self {
        self.log_to_file = enabled;
        self
    }

    pub fn run(self) -> Result<AppContext> {
        let work_dir = match self.work_root {
            Some(root) => WorkDir::init(root)?,
            None => WorkDir::init_default()?,
        };

        let log_dir = if self.log_to_file {
            Some(work_dir.log_dir()?)
        } else {
            None
        };
        let logging = logging::init(&LogConfig {
            level: self.log_level,
            log_dir,
        })?;

        tracing::debug!(work_dir = %work_dir.root().display(), "application initialized");
        Ok(AppContext { work_dir, logging })
    }
}

/// State produced by [`Bootstrap::run`].
#[derive(Debug)]
pub struct AppContext {
    work_dir: WorkDir,
    logging: LogInit,
}

impl AppContext {
    pub fn work_dir(&self) -> &WorkDir {
        &self.work_dir
    }

    pub fn work_root(&self) -> &Path {
        self.work_dir.root()
    }

    /// Outcome of the logging step; `AlreadyConfigured` when the embedding
    /// process had installed a subscriber before.
    pub fn logging(&self) -> &LogInit {
        &self.logging
    }
}
