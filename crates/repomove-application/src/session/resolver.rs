use std::sync::Arc;

use super::SessionCredentialRegistry;
use repomove_core::EnvSource;
use repomove_core::config::CredentialNames;
use repomove_core::credentials::CredentialKind;
use repomove_core::error::{RepoMoveError, Result};
use repomove_core::secret::Secret;

/// Decides which pre-issued secret a call should use.
///
/// Resolution order:
///
/// | kind      | 1st            | 2nd                    | 3rd            |
/// |-----------|----------------|------------------------|----------------|
/// | origin    | session value  | `credentials.origin.env` | `shared_env` |
/// | target    | session value  | `credentials.target.env` | `shared_env` |
/// | secondary | session value  | `credentials.secondary.env` | -         |
///
/// For the secondary kind, a value equal to `unset_sentinel` counts as absent.
/// Resolution has no side effects and never logs a secret value.
pub struct CredentialResolver {
    registry: Arc<SessionCredentialRegistry>,
    env: Arc<dyn EnvSource>,
    names: CredentialNames,
}

impl CredentialResolver {
    pub fn new(
        registry: Arc<SessionCredentialRegistry>,
        env: Arc<dyn EnvSource>,
        names: CredentialNames,
    ) -> Self {
        Self {
            registry,
            env,
            names,
        }
    }

    pub fn names(&self) -> &CredentialNames {
        &self.names
    }

    /// Resolves the secret of `kind` for an optional session scope.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationMissing` naming the header, query parameter and
    /// environment variables that were consulted.
    pub async fn resolve(&self, kind: CredentialKind, session_id: Option<&str>) -> Result<Secret> {
        if let Some(session_id) = session_id {
            let scoped = self
                .registry
                .get(session_id)
                .await
                .and_then(|creds| creds.get(kind).cloned())
                .filter(|secret| !self.is_unset(kind, secret.expose()));

            if let Some(secret) = scoped {
                tracing::debug!(session_id, kind = %kind, "Resolved secret from session");
                return Ok(secret);
            }
        }

        for var in self.env_chain(kind) {
            if let Some(value) = self.env.var(var) {
                if self.is_unset(kind, &value) {
                    continue;
                }
                tracing::debug!(kind = %kind, env = var, "Resolved secret from environment");
                return Ok(Secret::new(value));
            }
        }

        let source = kind.names(&self.names);
        Err(RepoMoveError::ConfigurationMissing {
            kind: kind.label().to_string(),
            header: source.header.clone(),
            query: source.query.clone(),
            env_vars: self.env_chain(kind).iter().map(|v| v.to_string()).collect(),
        })
    }

    fn env_chain(&self, kind: CredentialKind) -> Vec<&str> {
        match kind {
            CredentialKind::Origin => vec![&self.names.origin.env, &self.names.shared_env],
            CredentialKind::Target => vec![&self.names.target.env, &self.names.shared_env],
            CredentialKind::Secondary => vec![&self.names.secondary.env],
        }
        .into_iter()
        .map(String::as_str)
        .collect()
    }

    fn is_unset(&self, kind: CredentialKind, value: &str) -> bool {
        kind == CredentialKind::Secondary && value == self.names.unset_sentinel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repomove_core::credentials::SessionCredentials;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> Arc<dyn EnvSource> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Arc::new(map)
    }

    fn resolver(
        registry: Arc<SessionCredentialRegistry>,
        env: Arc<dyn EnvSource>,
    ) -> CredentialResolver {
        CredentialResolver::new(registry, env, CredentialNames::default())
    }

    #[tokio::test]
    async fn test_session_value_wins() {
        let registry = Arc::new(SessionCredentialRegistry::new());
        registry
            .open(
                "S1",
                SessionCredentials {
                    origin: Some(Secret::new("tok-A")),
                    ..Default::default()
                },
            )
            .await;
        let resolver = resolver(registry, env(&[("GH_SOURCE_PAT", "env-source")]));

        let secret = resolver.resolve(CredentialKind::Origin, Some("S1")).await.unwrap();
        assert_eq!(secret.expose(), "tok-A");
    }

    #[tokio::test]
    async fn test_unknown_session_without_env_fails_naming_sources() {
        let registry = Arc::new(SessionCredentialRegistry::new());
        registry
            .open(
                "S1",
                SessionCredentials {
                    origin: Some(Secret::new("tok-A")),
                    ..Default::default()
                },
            )
            .await;
        let resolver = resolver(registry, env(&[]));

        let err = resolver.resolve(CredentialKind::Origin, Some("S2")).await.unwrap_err();
        match err {
            RepoMoveError::ConfigurationMissing {
                header, env_vars, ..
            } => {
                assert_eq!(header, "X-GH-Source-PAT");
                assert_eq!(env_vars, vec!["GH_SOURCE_PAT", "GH_PAT"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_env_fallback_order() {
        let registry = Arc::new(SessionCredentialRegistry::new());

        let both = resolver(
            registry.clone(),
            env(&[("GH_TARGET_PAT", "target"), ("GH_PAT", "shared")]),
        );
        assert_eq!(both.resolve(CredentialKind::Target, None).await.unwrap().expose(), "target");

        let shared_only = resolver(registry, env(&[("GH_PAT", "shared")]));
        assert_eq!(
            shared_only.resolve(CredentialKind::Target, None).await.unwrap().expose(),
            "shared"
        );
        assert_eq!(
            shared_only.resolve(CredentialKind::Origin, None).await.unwrap().expose(),
            "shared"
        );
    }

    #[tokio::test]
    async fn test_secondary_never_uses_shared_default() {
        let registry = Arc::new(SessionCredentialRegistry::new());
        let resolver = resolver(registry, env(&[("GH_PAT", "shared")]));

        let err = resolver.resolve(CredentialKind::Secondary, None).await.unwrap_err();
        assert!(err.is_configuration_missing());
        assert!(err.to_string().contains("ADO_PAT"));
    }

    #[tokio::test]
    async fn test_secondary_sentinel_is_absent() {
        let registry = Arc::new(SessionCredentialRegistry::new());
        registry
            .open(
                "S1",
                SessionCredentials {
                    secondary: Some(Secret::new("not-set")),
                    ..Default::default()
                },
            )
            .await;

        let with_env = resolver(registry.clone(), env(&[("ADO_PAT", "ado-env")]));
        assert_eq!(
            with_env
                .resolve(CredentialKind::Secondary, Some("S1"))
                .await
                .unwrap()
                .expose(),
            "ado-env"
        );

        let sentinel_env = resolver(registry, env(&[("ADO_PAT", "not-set")]));
        assert!(
            sentinel_env
                .resolve(CredentialKind::Secondary, Some("S1"))
                .await
                .unwrap_err()
                .is_configuration_missing()
        );
    }

    #[tokio::test]
    async fn test_sentinel_only_applies_to_secondary() {
        let registry = Arc::new(SessionCredentialRegistry::new());
        let resolver = resolver(registry, env(&[("GH_PAT", "not-set")]));

        assert_eq!(
            resolver.resolve(CredentialKind::Target, None).await.unwrap().expose(),
            "not-set"
        );
    }
}
