//! Configuration service implementation.
//!
//! Loads the root configuration from `config.toml` and caches it.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::paths::RepoMovePaths;
use repomove_core::config::RootConfig;
use repomove_core::error::{RepoMoveError, Result};

/// Configuration service that loads and caches the root configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    paths: RepoMovePaths,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<RootConfig>>>,
}

impl ConfigService {
    /// Creates a service reading `<config_dir>/repomove/config.toml`.
    pub fn new(base_path: Option<&Path>) -> Result<Self> {
        let paths = RepoMovePaths::new(base_path);
        let path = paths.config_file()?;
        Ok(Self {
            path,
            paths,
            config: Arc::new(RwLock::new(None)),
        })
    }

    /// Creates a service reading an explicit config file.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            paths: RepoMovePaths::default(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.path
    }

    /// Gets the root configuration, loading from file if not cached.
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn get_config(&self) -> Result<RootConfig> {
        {
            let read_lock = self.config.read().unwrap_or_else(|e| e.into_inner());
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let loaded = self.load_config()?;

        {
            let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
            *write_lock = Some(loaded.clone());
        }

        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = None;
    }

    /// Returns the state file path: the configured override, else the default location.
    pub fn state_file(&self) -> Result<PathBuf> {
        match self.get_config()?.storage.state_file {
            Some(path) => Ok(path),
            None => Ok(self.paths.state_file()?),
        }
    }

    fn load_config(&self) -> Result<RootConfig> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "No config file, using defaults");
            return Ok(RootConfig::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        toml::from_str(&content).map_err(|e| {
            RepoMoveError::config(format!(
                "Failed to parse {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}
