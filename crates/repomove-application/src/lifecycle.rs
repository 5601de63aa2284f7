//! Migration lifecycle: start, observe, wait, abort.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::session::CredentialResolver;
use repomove_core::credentials::CredentialKind;
use repomove_core::error::{RepoMoveError, Result};
use repomove_core::migration::{
    MigrationProvider, MigrationRecord, MigrationState, MigrationStateRepository, PlatformKind,
    WaitOutcome,
};
use repomove_core::secret::Secret;

/// Parameters of a single repository migration start.
#[derive(Debug, Clone)]
pub struct StartMigration {
    pub origin_org: String,
    pub target_org: String,
    pub origin_repo_url: String,
    pub target_org_id: String,
    pub source_id: String,
    pub target_repo_name: String,
    pub platform: PlatformKind,
    /// Token the provider uses to read the origin repository
    pub access_token: Secret,
}

/// Result of an abort request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AbortOutcome {
    pub record: MigrationRecord,
    /// Whether the provider confirmed the cancellation
    pub provider_confirmed: bool,
}

enum WaitStop {
    Terminal(MigrationState),
    Cancelled,
    TimedOut,
}

/// Drives one migration from start to a terminal state.
///
/// Every provider call is authenticated with the target secret resolved for
/// the caller's session, and every observed state is written through the
/// repository before it is returned.
pub struct MigrationLifecycleController {
    provider: Arc<dyn MigrationProvider>,
    repository: Arc<dyn MigrationStateRepository>,
    resolver: Arc<CredentialResolver>,
    poll_interval: Duration,
}

impl MigrationLifecycleController {
    pub fn new(
        provider: Arc<dyn MigrationProvider>,
        repository: Arc<dyn MigrationStateRepository>,
        resolver: Arc<CredentialResolver>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            provider,
            repository,
            resolver,
            poll_interval,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Starts a migration and records it as `QUEUED`.
    pub async fn start(&self, request: StartMigration, session_id: Option<&str>) -> Result<String> {
        let auth = self.target_auth(session_id).await?;

        let migration_id = self
            .provider
            .start_migration(
                &auth,
                &request.source_id,
                &request.target_org_id,
                &request.origin_repo_url,
                &request.target_repo_name,
                &request.access_token,
            )
            .await?;

        let record = MigrationRecord::queued(
            migration_id.clone(),
            request.origin_org,
            request.target_org,
            request.target_repo_name,
            request.platform,
        );
        self.repository.record_new(record).await?;

        tracing::info!(
            migration_id = %migration_id,
            repository = %request.origin_repo_url,
            "Migration started"
        );
        Ok(migration_id)
    }

    /// Queries the provider once and persists what it reports.
    ///
    /// Provider failures propagate unchanged; nothing is retried here.
    pub async fn refresh(
        &self,
        migration_id: &str,
        session_id: Option<&str>,
    ) -> Result<MigrationRecord> {
        let previous = self.require(migration_id).await?;
        let auth = self.target_auth(session_id).await?;

        let status = self.provider.get_migration_status(&auth, migration_id).await?;
        let record = self
            .repository
            .update_state(migration_id, status.state, status.failure_reason)
            .await?;

        if record.state != previous.state {
            tracing::info!(
                migration_id,
                from = %previous.state,
                to = %record.state,
                "Migration state changed"
            );
        } else {
            tracing::debug!(migration_id, state = %record.state, "Migration state unchanged");
        }
        Ok(record)
    }

    pub async fn refresh_status(
        &self,
        migration_id: &str,
        session_id: Option<&str>,
    ) -> Result<MigrationState> {
        Ok(self.refresh(migration_id, session_id).await?.state)
    }

    /// Polls until the migration is terminal, `timeout` elapses, or `cancel`
    /// fires.
    ///
    /// The first poll happens immediately and then once per poll interval.
    /// Neither the timeout nor cancellation touches the remote migration; call
    /// [`abort`](Self::abort) to stop it.
    pub async fn wait_until_terminal(
        &self,
        migration_id: &str,
        timeout: Duration,
        session_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<WaitOutcome> {
        let started = Instant::now();

        let current = self.require(migration_id).await?;
        if current.state.is_terminal() {
            return Ok(WaitOutcome {
                completed: true,
                final_state: Some(current.state),
                last_state: Some(current.state),
                elapsed: started.elapsed(),
                polls: 0,
                cancelled: false,
            });
        }

        let deadline = tokio::time::sleep_until(started + timeout);
        tokio::pin!(deadline);

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut polls = 0u32;
        let mut last_state = Some(current.state);

        // Each poll, provider call included, races the token and the deadline
        let stop = loop {
            let poll = async {
                ticker.tick().await;
                self.refresh_status(migration_id, session_id).await
            };

            tokio::select! {
                biased;

                _ = cancel.cancelled() => break WaitStop::Cancelled,
                _ = &mut deadline => break WaitStop::TimedOut,
                result = poll => {
                    let state = result?;
                    polls += 1;
                    last_state = Some(state);
                    if state.is_terminal() {
                        break WaitStop::Terminal(state);
                    }
                }
            }
        };

        let elapsed = started.elapsed();
        match stop {
            WaitStop::Terminal(state) => Ok(WaitOutcome {
                completed: true,
                final_state: Some(state),
                last_state,
                elapsed,
                polls,
                cancelled: false,
            }),
            WaitStop::Cancelled => {
                tracing::info!(migration_id, polls, "Wait cancelled by caller");
                Ok(WaitOutcome {
                    completed: false,
                    final_state: None,
                    last_state,
                    elapsed,
                    polls,
                    cancelled: true,
                })
            }
            WaitStop::TimedOut => {
                tracing::info!(
                    migration_id,
                    polls,
                    timeout_secs = timeout.as_secs(),
                    "Wait timed out; migration left running"
                );
                Ok(WaitOutcome {
                    completed: false,
                    final_state: None,
                    last_state,
                    elapsed,
                    polls,
                    cancelled: false,
                })
            }
        }
    }

    /// Requests provider cancellation and marks the record `ABORTED`.
    ///
    /// The local record is marked even when the provider answers that it could
    /// not confirm the stop. A provider error propagates and leaves the record
    /// untouched. Records already terminal are returned as they are.
    pub async fn abort(
        &self,
        migration_id: &str,
        session_id: Option<&str>,
    ) -> Result<AbortOutcome> {
        let current = self.require(migration_id).await?;
        if current.state.is_terminal() {
            tracing::debug!(
                migration_id,
                state = %current.state,
                "Abort skipped, already terminal"
            );
            return Ok(AbortOutcome {
                record: current,
                provider_confirmed: false,
            });
        }

        let auth = self.target_auth(session_id).await?;
        let provider_confirmed = self.provider.abort_migration(&auth, migration_id).await?;
        if !provider_confirmed {
            tracing::warn!(migration_id, "Provider did not confirm abort; marking ABORTED anyway");
        }

        let record = self
            .repository
            .update_state(migration_id, MigrationState::Aborted, None)
            .await?;
        tracing::info!(migration_id, provider_confirmed, "Migration aborted");

        Ok(AbortOutcome {
            record,
            provider_confirmed,
        })
    }

    async fn require(&self, migration_id: &str) -> Result<MigrationRecord> {
        self.repository
            .get(migration_id)
            .await?
            .ok_or_else(|| RepoMoveError::not_found("Migration", migration_id))
    }

    async fn target_auth(&self, session_id: Option<&str>) -> Result<Secret> {
        self.resolver.resolve(CredentialKind::Target, session_id).await
    }
}
