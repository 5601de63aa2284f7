//! File-backed migration state store.
//!
//! The store is the only writer of `state.json`. Every mutation runs as one
//! locked read-modify-write cycle:
//!
//! 1. a process-wide async mutex serialises callers in this process,
//! 2. an exclusive `fs2` lock on `state.lock` serialises processes,
//! 3. the document revision is re-read before commit; a mismatch means some
//!    writer skipped both locks, and the cycle is retried from a fresh load.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::storage::{AtomicJsonError, AtomicJsonFile, Revisioned};
use repomove_core::error::{RepoMoveError, Result};
use repomove_core::migration::{
    MigrationRecord, MigrationState, MigrationStateRepository, MigrationStateRoot,
};

const MAX_CONFLICT_RETRIES: usize = 3;

impl Revisioned for MigrationStateRoot {
    fn revision(&self) -> u64 {
        self.revision
    }

    fn set_revision(&mut self, revision: u64) {
        self.revision = revision;
    }
}

/// Durable store of active migrations, history and source aliases.
#[derive(Clone)]
pub struct MigrationStateStore {
    file: Arc<AtomicJsonFile<MigrationStateRoot>>,
    /// Global write lock around every read-modify-write cycle.
    write_lock: Arc<Mutex<()>>,
}

impl MigrationStateStore {
    /// Opens the store backed by `path`. The file is created on first write.
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: Arc::new(AtomicJsonFile::new(path)),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Loads the whole persisted root.
    pub async fn snapshot(&self) -> Result<MigrationStateRoot> {
        let file = self.file.clone();
        let root = tokio::task::spawn_blocking(move || file.read())
            .await
            .map_err(|e| RepoMoveError::internal(format!("Failed to join task: {}", e)))??;
        Ok(root.unwrap_or_default())
    }

    async fn mutate<R, F>(&self, f: F) -> Result<R>
    where
        F: Fn(&mut MigrationStateRoot) -> Result<R> + Send + Sync + 'static,
        R: Send + 'static,
    {
        let _guard = self.write_lock.lock().await;
        let f = Arc::new(f);

        let mut attempt = 0;
        loop {
            attempt += 1;
            let file = self.file.clone();
            let f = f.clone();
            let outcome = tokio::task::spawn_blocking(move || {
                let f = f.as_ref();
                file.update(MigrationStateRoot::default(), |root| f(root))
            })
            .await
            .map_err(|e| RepoMoveError::internal(format!("Failed to join task: {}", e)))?;

            match outcome {
                Ok(value) => return Ok(value),
                Err(AtomicJsonError::RevisionConflict { expected, found })
                    if attempt < MAX_CONFLICT_RETRIES =>
                {
                    tracing::warn!(
                        path = %self.file.path().display(),
                        expected,
                        found,
                        attempt,
                        "State file changed outside the store lock, retrying"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[async_trait]
impl MigrationStateRepository for MigrationStateStore {
    async fn record_new(&self, record: MigrationRecord) -> Result<()> {
        let id = record.id.clone();
        self.mutate(move |root| root.insert_new(record.clone())).await?;
        tracing::debug!(migration_id = %id, "Recorded new migration");
        Ok(())
    }

    async fn update_state(
        &self,
        id: &str,
        state: MigrationState,
        failure_reason: Option<String>,
    ) -> Result<MigrationRecord> {
        let key = id.to_string();
        let record = self
            .mutate(move |root| root.apply_state(&key, state, failure_reason.clone(), Utc::now()))
            .await?;

        tracing::debug!(
            migration_id = %id,
            state = %record.state,
            completed = record.completed_at.is_some(),
            "Updated migration state"
        );
        Ok(record)
    }

    async fn get(&self, id: &str) -> Result<Option<MigrationRecord>> {
        Ok(self.snapshot().await?.find(id).cloned())
    }

    async fn list_active(&self) -> Result<Vec<MigrationRecord>> {
        Ok(self.snapshot().await?.active_migrations)
    }

    async fn list_history(&self, limit: Option<usize>) -> Result<Vec<MigrationRecord>> {
        Ok(self.snapshot().await?.history_tail(limit))
    }

    async fn get_source_id(&self, origin_org_url: &str) -> Result<Option<String>> {
        Ok(self
            .snapshot()
            .await?
            .source_id(origin_org_url)
            .map(str::to_string))
    }

    async fn put_source_id(&self, origin_org_url: &str, source_id: &str) -> Result<()> {
        let url = origin_org_url.to_string();
        let id = source_id.to_string();
        let inserted = self
            .mutate(move |root| Ok(root.insert_source(&url, &id)))
            .await?;

        if !inserted {
            tracing::warn!(
                origin_org_url,
                "Migration source already registered, keeping the existing alias"
            );
        }
        Ok(())
    }

    async fn list_sources(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.snapshot().await?.migration_sources)
    }
}
