//! Configuration model.
//!
//! Every section has a complete default so an absent or partial `config.toml`
//! still yields a usable configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct RootConfig {
    pub credentials: CredentialNames,
    pub polling: PollingConfig,
    pub sessions: SessionConfig,
    pub storage: StorageConfig,
}

/// Where one kind of secret may be supplied.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SecretSourceNames {
    /// Request header name (matched case-insensitively).
    pub header: String,
    /// Query parameter name, consulted when the header is absent.
    pub query: String,
    /// Kind-specific environment default.
    pub env: String,
}

impl SecretSourceNames {
    fn new(header: &str, query: &str, env: &str) -> Self {
        Self {
            header: header.to_string(),
            query: query.to_string(),
            env: env.to_string(),
        }
    }
}

/// Names used to look up each secret kind.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CredentialNames {
    pub origin: SecretSourceNames,
    pub target: SecretSourceNames,
    pub secondary: SecretSourceNames,
    /// Shared default used by origin and target when their own variable is unset.
    pub shared_env: String,
    /// Literal value meaning "intentionally unset" for the secondary secret.
    pub unset_sentinel: String,
}

impl Default for CredentialNames {
    fn default() -> Self {
        Self {
            origin: SecretSourceNames::new("X-GH-Source-PAT", "gh_source_pat", "GH_SOURCE_PAT"),
            target: SecretSourceNames::new("X-GH-Target-PAT", "gh_target_pat", "GH_TARGET_PAT"),
            secondary: SecretSourceNames::new("X-ADO-PAT", "ado_pat", "ADO_PAT"),
            shared_env: "GH_PAT".to_string(),
            unset_sentinel: "not-set".to_string(),
        }
    }
}

/// Cadence of migration status polling.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_secs: u64,
    pub default_timeout_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            default_timeout_secs: 600,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }
}

/// Session registry behaviour.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    /// When set, sessions unused for this long are swept by the idle reaper.
    /// Unset means a session lives exactly as long as its connection.
    pub idle_ttl_secs: Option<u64>,
}

impl SessionConfig {
    pub fn idle_ttl(&self) -> Option<Duration> {
        self.idle_ttl_secs.map(Duration::from_secs)
    }
}

/// Location of the persisted migration state.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    pub state_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: RootConfig = toml::from_str(
            r#"
            [polling]
            interval_secs = 30

            [credentials.secondary]
            header = "X-Bitbucket-Token"
            query = "bb_token"
            env = "BB_TOKEN"
            "#,
        )
        .unwrap();

        assert_eq!(config.polling.interval_secs, 30);
        assert_eq!(config.polling.default_timeout_secs, 600);
        assert_eq!(config.credentials.secondary.env, "BB_TOKEN");
        assert_eq!(config.credentials.origin.env, "GH_SOURCE_PAT");
        assert_eq!(config.credentials.shared_env, "GH_PAT");
        assert!(config.sessions.idle_ttl().is_none());
        assert!(config.storage.state_file.is_none());
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let polling = PollingConfig {
            interval_secs: 0,
            default_timeout_secs: 5,
        };
        assert_eq!(polling.interval(), Duration::from_secs(1));
        assert_eq!(polling.default_timeout(), Duration::from_secs(5));
    }
}
