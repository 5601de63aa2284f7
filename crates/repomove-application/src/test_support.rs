//! In-memory doubles for the provider and repository traits.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use repomove_core::error::{RepoMoveError, Result};
use repomove_core::migration::{
    MigrationProvider, MigrationRecord, MigrationState, MigrationStateRepository,
    MigrationStateRoot, MigrationStatus, PlatformKind,
};
use repomove_core::secret::Secret;

#[derive(Default)]
pub struct InMemoryStateRepository {
    root: tokio::sync::Mutex<MigrationStateRoot>,
}

impl InMemoryStateRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MigrationStateRepository for InMemoryStateRepository {
    async fn record_new(&self, record: MigrationRecord) -> Result<()> {
        self.root.lock().await.insert_new(record)
    }

    async fn update_state(
        &self,
        id: &str,
        state: MigrationState,
        failure_reason: Option<String>,
    ) -> Result<MigrationRecord> {
        self.root
            .lock()
            .await
            .apply_state(id, state, failure_reason, Utc::now())
    }

    async fn get(&self, id: &str) -> Result<Option<MigrationRecord>> {
        Ok(self.root.lock().await.find(id).cloned())
    }

    async fn list_active(&self) -> Result<Vec<MigrationRecord>> {
        Ok(self.root.lock().await.active_migrations.clone())
    }

    async fn list_history(&self, limit: Option<usize>) -> Result<Vec<MigrationRecord>> {
        Ok(self.root.lock().await.history_tail(limit))
    }

    async fn get_source_id(&self, origin_org_url: &str) -> Result<Option<String>> {
        Ok(self.root.lock().await.source_id(origin_org_url).map(str::to_string))
    }

    async fn put_source_id(&self, origin_org_url: &str, source_id: &str) -> Result<()> {
        self.root.lock().await.insert_source(origin_org_url, source_id);
        Ok(())
    }

    async fn list_sources(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.root.lock().await.migration_sources.clone())
    }
}

/// Scripted provider.
///
/// Each migration replays its queued states one per status call; the last
/// state repeats forever.
#[derive(Default)]
pub struct MockProvider {
    scripts: Mutex<HashMap<String, VecDeque<MigrationState>>>,
    pub sources_created: AtomicUsize,
    pub migrations_started: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub aborts: Mutex<Vec<String>>,
    pub decline_abort: AtomicBool,
    pub fail_status: AtomicBool,
    pub fail_abort: AtomicBool,
    pub auth_seen: Mutex<Vec<String>>,
    /// Delay before every status answer
    pub status_delay: Mutex<Duration>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, migration_id: &str, states: &[MigrationState]) {
        self.scripts
            .lock()
            .unwrap()
            .insert(migration_id.to_string(), states.iter().copied().collect());
    }

    fn saw(&self, auth: &Secret) {
        self.auth_seen.lock().unwrap().push(auth.expose().to_string());
    }
}

#[async_trait]
impl MigrationProvider for MockProvider {
    async fn create_migration_source(
        &self,
        auth: &Secret,
        _target_org_id: &str,
        _origin_org_url: &str,
        _platform: PlatformKind,
    ) -> Result<String> {
        self.saw(auth);
        let n = self.sources_created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("MS_{}", n))
    }

    async fn start_migration(
        &self,
        auth: &Secret,
        _source_id: &str,
        _target_org_id: &str,
        _origin_repo_url: &str,
        _target_repo_name: &str,
        _access_token: &Secret,
    ) -> Result<String> {
        self.saw(auth);
        let n = self.migrations_started.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("m-{}", n))
    }

    async fn get_migration_status(
        &self,
        auth: &Secret,
        migration_id: &str,
    ) -> Result<MigrationStatus> {
        self.saw(auth);
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.status_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_status.load(Ordering::SeqCst) {
            return Err(RepoMoveError::external_with_status(
                "getMigrationStatus",
                503,
                "unavailable",
            ));
        }

        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts
            .get_mut(migration_id)
            .ok_or_else(|| RepoMoveError::external("getMigrationStatus", "unknown migration"))?;
        let state = if script.len() > 1 {
            script.pop_front().unwrap_or(MigrationState::Queued)
        } else {
            script.front().copied().unwrap_or(MigrationState::Queued)
        };

        Ok(MigrationStatus {
            id: migration_id.to_string(),
            state,
            repository_name: "repo".to_string(),
            created_at: Utc::now(),
            failure_reason: (state == MigrationState::Failed)
                .then(|| "provider failure".to_string()),
        })
    }

    async fn abort_migration(&self, auth: &Secret, migration_id: &str) -> Result<bool> {
        self.saw(auth);
        if self.fail_abort.load(Ordering::SeqCst) {
            return Err(RepoMoveError::external("abortRepositoryMigration", "forbidden"));
        }
        self.aborts.lock().unwrap().push(migration_id.to_string());
        Ok(!self.decline_abort.load(Ordering::SeqCst))
    }

    async fn resolve_organization_id(&self, auth: &Secret, org_name: &str) -> Result<String> {
        self.saw(auth);
        Ok(format!("O_{}", org_name))
    }
}
