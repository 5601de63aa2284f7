//! Idempotent migration source registration.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;

use repomove_core::error::Result;
use repomove_core::migration::MigrationStateRepository;

type KeyLocks = StdMutex<HashMap<String, Arc<Mutex<()>>>>;

/// Maps an origin organization URL to its provider-assigned migration source.
///
/// The mapping is persisted through the state repository and is permanent:
/// once an origin has a source ID, every later `ensure` returns it.
///
/// A mutex per URL is held across lookup, creation and persistence, so two
/// concurrent first-time registrations of the same origin call the provider
/// once. Different origins never wait on each other.
pub struct MigrationSourceCache {
    repository: Arc<dyn MigrationStateRepository>,
    key_locks: KeyLocks,
}

impl MigrationSourceCache {
    pub fn new(repository: Arc<dyn MigrationStateRepository>) -> Self {
        Self {
            repository,
            key_locks: StdMutex::new(HashMap::new()),
        }
    }

    /// Returns the source ID for `origin_org_url`, calling `create` only when
    /// none is recorded yet.
    pub async fn ensure<F, Fut>(&self, origin_org_url: &str, create: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let url = canonical_org_url(origin_org_url);
        let lease = KeyLease::acquire(&self.key_locks, &url);
        let _guard = lease.lock.lock().await;
        self.lookup_or_create(&url, create).await
    }

    async fn lookup_or_create<F, Fut>(&self, url: &str, create: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        if let Some(source_id) = self.repository.get_source_id(url).await? {
            tracing::debug!(
                origin_org_url = url,
                source_id = %source_id,
                "Migration source cache hit"
            );
            return Ok(source_id);
        }

        let source_id = create().await?;
        self.repository.put_source_id(url, &source_id).await?;
        tracing::info!(
            origin_org_url = url,
            source_id = %source_id,
            "Registered migration source"
        );
        Ok(source_id)
    }
}

/// A caller's handle on one per-URL lock.
///
/// Dropping the lease, including when `ensure` is cancelled mid-flight,
/// removes the map entry once no other caller holds it.
struct KeyLease<'a> {
    locks: &'a KeyLocks,
    url: String,
    lock: Arc<Mutex<()>>,
}

impl<'a> KeyLease<'a> {
    fn acquire(locks: &'a KeyLocks, url: &str) -> Self {
        let lock = locks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(url.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        Self {
            locks,
            url: url.to_string(),
            lock,
        }
    }
}

impl Drop for KeyLease<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // The map and this lease are the only holders
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.url);
        }
    }
}

/// Normalises an origin organization URL for use as a cache key.
pub fn canonical_org_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
