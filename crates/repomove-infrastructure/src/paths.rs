//! Unified path management for repomove files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/repomove/          # Config directory
//! └── config.toml              # Application configuration
//!
//! ~/.local/share/repomove/     # Data directory
//! └── state.json               # Active migrations, history, source aliases
//! ```
//!
//! Passing a base path (tests, `--home` style overrides) puts both files
//! directly under that directory.

use std::path::{Path, PathBuf};

const APP_DIR: &str = "repomove";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for repomove_core::RepoMoveError {
    fn from(err: PathError) -> Self {
        repomove_core::RepoMoveError::config(err.to_string())
    }
}

/// Resolves where repomove keeps its files.
#[derive(Debug, Clone, Default)]
pub struct RepoMovePaths {
    base: Option<PathBuf>,
}

impl RepoMovePaths {
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
        }
    }

    /// Returns the configuration directory (e.g., `~/.config/repomove/`).
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    /// Returns the data directory (e.g., `~/.local/share/repomove/`).
    pub fn data_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    pub fn state_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.data_dir()?.join("state.json"))
    }
}
