pub mod config;
pub mod inspect;

use anyhow::{Context as _, Result};
use serde::Serialize;
use std::path::PathBuf;

use repomove_core::config::RootConfig;
use repomove_infrastructure::{ConfigService, MigrationStateStore};

/// Resolved configuration and store shared by every command.
pub struct Context {
    pub config_path: PathBuf,
    pub config: RootConfig,
    pub store: MigrationStateStore,
}

impl Context {
    pub fn load(config_path: Option<PathBuf>, state_file: Option<PathBuf>) -> Result<Self> {
        let service = match config_path {
            Some(path) => ConfigService::with_path(path),
            None => ConfigService::new(None).context("Failed to locate config directory")?,
        };
        let config = service.get_config().context("Failed to load configuration")?;

        let state_file = match state_file {
            Some(path) => path,
            None => service.state_file().context("Failed to locate state file")?,
        };
        tracing::debug!(state_file = %state_file.display(), "Using state file");

        Ok(Self {
            config_path: service.config_path().to_path_buf(),
            config,
            store: MigrationStateStore::new(state_file),
        })
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_uses_configured_state_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let state_path = temp_dir.path().join("custom-state.json");
        std::fs::write(
            &config_path,
            format!(
                "[storage]\nstate_file = {:?}\n\n[polling]\ninterval_secs = 30\n",
                state_path.display().to_string()
            ),
        )
        .unwrap();

        let ctx = Context::load(Some(config_path.clone()), None).unwrap();

        assert_eq!(ctx.config_path, config_path);
        assert_eq!(ctx.store.path(), state_path.as_path());
        assert_eq!(ctx.config.polling.interval_secs, 30);
    }

    #[test]
    fn test_state_file_flag_wins() {
        let temp_dir = TempDir::new().unwrap();
        let override_path = temp_dir.path().join("override.json");

        let ctx = Context::load(
            Some(temp_dir.path().join("missing.toml")),
            Some(override_path.clone()),
        )
        .unwrap();

        assert_eq!(ctx.store.path(), override_path.as_path());
        assert_eq!(ctx.config, RootConfig::default());
    }
}
