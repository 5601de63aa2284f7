use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use repomove_core::credentials::SessionCredentials;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

struct SessionEntry {
    credentials: SessionCredentials,
    /// Last open or lookup; lookups only hold the map's read lock.
    last_seen: Mutex<Instant>,
}

impl SessionEntry {
    fn touch(&self) {
        *self.last_seen.lock().unwrap_or_else(|e| e.into_inner()) = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .elapsed()
    }
}

/// Per-connection store of scoped credentials.
///
/// One registry is shared by every connection in the process and handed to
/// request handlers behind an `Arc`. Writes take the map exclusively, so a
/// `get` never observes a partially written entry, and an entry inserted under
/// one session ID is only ever returned for that ID.
///
/// Entries are removed when the owning transport calls [`close`](Self::close).
/// A transport that never signals closure leaks its entry unless the idle
/// reaper is running. Every `get` counts as activity, so the reaper only
/// removes sessions nobody has used for the whole TTL.
pub struct SessionCredentialRegistry {
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionCredentialRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Registers credentials for a newly opened connection.
    ///
    /// Re-opening an existing session ID replaces its credentials.
    pub async fn open(&self, session_id: impl Into<String>, credentials: SessionCredentials) {
        let session_id = session_id.into();
        tracing::debug!(
            session_id = %session_id,
            origin = credentials.origin.is_some(),
            target = credentials.target.is_some(),
            secondary = credentials.secondary.is_some(),
            "Session opened"
        );

        let mut sessions = self.sessions.write().await;
        sessions.insert(
            session_id,
            SessionEntry {
                credentials,
                last_seen: Mutex::new(Instant::now()),
            },
        );
    }

    /// Registers credentials under a freshly generated session ID.
    pub async fn open_new(&self, credentials: SessionCredentials) -> String {
        let session_id = Uuid::new_v4().to_string();
        self.open(session_id.clone(), credentials).await;
        session_id
    }

    /// Gets the credentials of a live session and marks it as in use.
    pub async fn get(&self, session_id: &str) -> Option<SessionCredentials> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).map(|entry| {
            entry.touch();
            entry.credentials.clone()
        })
    }

    /// Drops a session's credentials. Returns whether the session existed.
    pub async fn close(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id).is_some();
        tracing::debug!(session_id, removed, "Session closed");
        removed
    }

    /// Number of live sessions.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Removes sessions unused for at least `ttl` and returns how many went.
    pub async fn sweep_idle(&self, ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.idle_for() < ttl);
        before - sessions.len()
    }

    /// Spawns the idle reaper, sweeping every `interval` until `cancel` fires.
    pub fn spawn_reaper(
        self: &Arc<Self>,
        interval: Duration,
        ttl: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let registry = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            tracing::info!(
                interval_secs = interval.as_secs(),
                ttl_secs = ttl.as_secs(),
                "Session reaper started"
            );

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let swept = registry.sweep_idle(ttl).await;
                        if swept > 0 {
                            tracing::warn!(swept, "Reaped sessions that were never closed");
                        }
                    }
                }
            }

            tracing::info!("Session reaper stopped");
        })
    }
}

impl Default for SessionCredentialRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repomove_core::Secret;

    fn creds(origin: &str) -> SessionCredentials {
        SessionCredentials {
            origin: Some(Secret::new(origin)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_open_get_close() {
        let registry = SessionCredentialRegistry::new();
        registry.open("S1", creds("tok-A")).await;

        assert_eq!(registry.count().await, 1);
        assert_eq!(registry.get("S1").await, Some(creds("tok-A")));
        assert!(registry.get("S2").await.is_none());

        assert!(registry.close("S1").await);
        assert!(!registry.close("S1").await);
        assert_eq!(registry.count().await, 0);
        assert!(registry.get("S1").await.is_none());
    }

    #[tokio::test]
    async fn test_reopen_replaces_credentials() {
        let registry = SessionCredentialRegistry::new();
        registry.open("S1", creds("old")).await;
        registry.open("S1", creds("new")).await;

        assert_eq!(registry.count().await, 1);
        assert_eq!(registry.get("S1").await, Some(creds("new")));
    }

    #[tokio::test]
    async fn test_open_new_generates_distinct_ids() {
        let registry = SessionCredentialRegistry::new();
        let a = registry.open_new(creds("a")).await;
        let b = registry.open_new(creds("b")).await;

        assert_ne!(a, b);
        assert_eq!(registry.get(&a).await, Some(creds("a")));
        assert_eq!(registry.get(&b).await, Some(creds("b")));
    }

    #[tokio::test]
    async fn test_sweep_respects_ttl() {
        let registry = SessionCredentialRegistry::new();
        registry.open("S1", creds("a")).await;
        registry.open("S2", creds("b")).await;

        assert_eq!(registry.sweep_idle(Duration::from_secs(3600)).await, 0);
        assert_eq!(registry.count().await, 2);

        assert_eq!(registry.sweep_idle(Duration::ZERO).await, 2);
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_sweep_keeps_sessions_in_use() {
        let registry = SessionCredentialRegistry::new();
        registry.open("busy", creds("a")).await;
        registry.open("idle", creds("b")).await;

        for _ in 0..5 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            assert!(registry.get("busy").await.is_some());
        }

        assert_eq!(registry.sweep_idle(Duration::from_millis(50)).await, 1);
        assert_eq!(registry.get("busy").await, Some(creds("a")));
        assert!(registry.get("idle").await.is_none());
    }

    #[tokio::test]
    async fn test_reaper_stops_on_cancel() {
        let registry = Arc::new(SessionCredentialRegistry::new());
        registry.open("S1", creds("a")).await;

        let cancel = CancellationToken::new();
        let handle =
            registry.spawn_reaper(Duration::from_millis(10), Duration::ZERO, cancel.clone());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(registry.count().await, 0);

        cancel.cancel();
        handle.await.unwrap();
    }
}
