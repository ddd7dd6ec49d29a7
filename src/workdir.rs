//! Application work directory

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::error::{ErrorCategory, ErrorKind, PbeError, Result};

/// Sub-directory that receives log files.
pub const LOG_DIR: &str = "log";

/// Root directory under which the application keeps its files.
#[derive(Debug, Clone)]
pub struct WorkDir {
    root: PathBuf,
}

impl WorkDir {
    /// Use `root` as the work directory, creating it if needed.
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        create_dir(&root)?;
        Ok(Self { root })
    }

    /// Use the platform data directory (e.g. `~/.local/share/pbecoder`).
    pub fn init_default() -> Result<Self> {
        Self::init(default_root()?)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the named sub-directory, created if it does not exist yet.
    pub fn dir(&self, name: &str) -> Result<PathBuf> {
        let path = self.root.join(name);
        create_dir(&path)?;
        Ok(path)
    }

    pub fn log_dir(&self) -> Result<PathBuf> {
        self.dir(LOG_DIR)
    }
}

pub fn default_root() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "pbecoder").ok_or_else(|| {
        PbeError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "could not determine platform directories",
        )
    })?;
    Ok(project_dirs.data_dir().to_path_buf())
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| {
        PbeError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Io,
            format!("failed to create directory {}", path.display()),
            e,
        )
    })
}
