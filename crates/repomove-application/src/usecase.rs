//! Migration use case.
//!
//! Entry point for request handlers: every operation takes the caller's
//! optional session scope and resolves credentials for it before touching the
//! provider.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::lifecycle::{AbortOutcome, MigrationLifecycleController, StartMigration};
use crate::session::{CredentialResolver, SessionCredentialRegistry};
use crate::source_cache::MigrationSourceCache;
use repomove_core::EnvSource;
use repomove_core::config::RootConfig;
use repomove_core::credentials::{CredentialKind, SessionCredentials};
use repomove_core::error::{RepoMoveError, Result};
use repomove_core::migration::{
    MigrationProvider, MigrationRecord, MigrationStateRepository, PlatformKind, WaitOutcome,
};

const REAPER_MAX_INTERVAL: Duration = Duration::from_secs(60);

/// A repository migration as requested by a caller.
#[derive(Debug, Clone)]
pub struct StartRepositoryMigration {
    pub origin_org: String,
    pub origin_org_url: String,
    pub origin_repo_url: String,
    pub target_org: String,
    pub target_repo_name: String,
    pub platform: PlatformKind,
}

/// Use case for migration orchestration.
pub struct MigrationUseCase {
    provider: Arc<dyn MigrationProvider>,
    repository: Arc<dyn MigrationStateRepository>,
    registry: Arc<SessionCredentialRegistry>,
    resolver: Arc<CredentialResolver>,
    source_cache: MigrationSourceCache,
    controller: MigrationLifecycleController,
    default_timeout: Duration,
    idle_ttl: Option<Duration>,
}

impl MigrationUseCase {
    pub fn new(
        provider: Arc<dyn MigrationProvider>,
        repository: Arc<dyn MigrationStateRepository>,
        registry: Arc<SessionCredentialRegistry>,
        env: Arc<dyn EnvSource>,
        config: &RootConfig,
    ) -> Self {
        let resolver = Arc::new(CredentialResolver::new(
            registry.clone(),
            env,
            config.credentials.clone(),
        ));
        let controller = MigrationLifecycleController::new(
            provider.clone(),
            repository.clone(),
            resolver.clone(),
            config.polling.interval(),
        );

        Self {
            source_cache: MigrationSourceCache::new(repository.clone()),
            provider,
            repository,
            registry,
            resolver,
            controller,
            default_timeout: config.polling.default_timeout(),
            idle_ttl: config.sessions.idle_ttl(),
        }
    }

    pub fn registry(&self) -> &Arc<SessionCredentialRegistry> {
        &self.registry
    }

    /// Opens a session from the headers and query of a connection request.
    pub async fn open_session(
        &self,
        session_id: &str,
        headers: &HashMap<String, String>,
        query: &HashMap<String, String>,
    ) -> SessionCredentials {
        let credentials = SessionCredentials::from_request(headers, query, self.resolver.names());
        self.registry.open(session_id, credentials.clone()).await;
        credentials
    }

    pub async fn close_session(&self, session_id: &str) -> bool {
        self.registry.close(session_id).await
    }

    /// Starts the idle-session reaper when `[sessions] idle_ttl_secs` is set.
    pub fn spawn_session_reaper(&self, cancel: CancellationToken) -> Option<JoinHandle<()>> {
        let ttl = self.idle_ttl?;
        let interval = ttl.min(REAPER_MAX_INTERVAL);
        Some(self.registry.spawn_reaper(interval, ttl, cancel))
    }

    /// Starts a repository migration.
    ///
    /// Resolves the target and origin secrets, looks up the target
    /// organization, registers the origin organization as a migration source
    /// if it is not one yet, then starts the migration.
    pub async fn start_repository_migration(
        &self,
        request: StartRepositoryMigration,
        session_id: Option<&str>,
    ) -> Result<MigrationRecord> {
        let target_auth = self.resolver.resolve(CredentialKind::Target, session_id).await?;
        let origin_token = self
            .resolver
            .resolve(origin_credential(request.platform), session_id)
            .await?;

        let target_org_id = self
            .provider
            .resolve_organization_id(&target_auth, &request.target_org)
            .await?;

        let source_id = self
            .source_cache
            .ensure(&request.origin_org_url, || {
                self.provider.create_migration_source(
                    &target_auth,
                    &target_org_id,
                    &request.origin_org_url,
                    request.platform,
                )
            })
            .await?;

        let migration_id = self
            .controller
            .start(
                StartMigration {
                    origin_org: request.origin_org,
                    target_org: request.target_org,
                    origin_repo_url: request.origin_repo_url,
                    target_org_id,
                    source_id,
                    target_repo_name: request.target_repo_name,
                    platform: request.platform,
                    access_token: origin_token,
                },
                session_id,
            )
            .await?;

        self.repository
            .get(&migration_id)
            .await?
            .ok_or_else(|| {
                RepoMoveError::internal(format!("Migration {} was not recorded", migration_id))
            })
    }

    pub async fn status(
        &self,
        migration_id: &str,
        session_id: Option<&str>,
    ) -> Result<MigrationRecord> {
        self.controller.refresh(migration_id, session_id).await
    }

    /// Waits for a terminal state. `timeout` defaults to the configured one.
    pub async fn wait(
        &self,
        migration_id: &str,
        timeout: Option<Duration>,
        session_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<WaitOutcome> {
        let timeout = timeout.unwrap_or(self.default_timeout);
        self.controller
            .wait_until_terminal(migration_id, timeout, session_id, cancel)
            .await
    }

    pub async fn abort(
        &self,
        migration_id: &str,
        session_id: Option<&str>,
    ) -> Result<AbortOutcome> {
        self.controller.abort(migration_id, session_id).await
    }

    pub async fn list_active(&self) -> Result<Vec<MigrationRecord>> {
        self.repository.list_active().await
    }

    pub async fn list_history(&self, limit: Option<usize>) -> Result<Vec<MigrationRecord>> {
        self.repository.list_history(limit).await
    }

    pub async fn list_sources(&self) -> Result<BTreeMap<String, String>> {
        self.repository.list_sources().await
    }
}

/// Which secret reads the origin repository.
fn origin_credential(platform: PlatformKind) -> CredentialKind {
    match platform {
        PlatformKind::GitHub => CredentialKind::Origin,
        PlatformKind::AzureDevOps | PlatformKind::BitbucketServer => CredentialKind::Secondary,
    }
}
