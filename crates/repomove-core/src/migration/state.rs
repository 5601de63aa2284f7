//! Persisted migration state root.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::model::{MigrationRecord, MigrationState};
use crate::error::{RepoMoveError, Result};

/// Everything the state store persists.
///
/// `revision` increases by one on every successful write and lets the store
/// notice a writer that bypassed its lock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationStateRoot {
    #[serde(default)]
    pub revision: u64,
    /// In-flight migrations, in insertion order.
    #[serde(default)]
    pub active_migrations: Vec<MigrationRecord>,
    /// Terminal migrations, append-only in the order they finished.
    #[serde(default)]
    pub migration_history: Vec<MigrationRecord>,
    /// Origin organization URL → provider-assigned migration source ID.
    #[serde(default)]
    pub migration_sources: BTreeMap<String, String>,
}

impl MigrationStateRoot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a newly started migration to the active set.
    ///
    /// A record that is already terminal goes straight to history so the
    /// active set never holds a terminal record.
    pub fn insert_new(&mut self, record: MigrationRecord) -> Result<()> {
        if self.find(&record.id).is_some() {
            return Err(RepoMoveError::conflict(format!(
                "migration '{}' is already recorded",
                record.id
            )));
        }

        if record.state.is_terminal() {
            let mut record = record;
            record.completed_at.get_or_insert_with(Utc::now);
            self.migration_history.push(record);
        } else {
            self.active_migrations.push(record);
        }
        Ok(())
    }

    /// Writes a new state for `id` and returns the resulting record.
    ///
    /// An active record that reaches a terminal state is removed from the
    /// active set, stamped with `completed_at = now`, and appended to history
    /// in the same call. History records keep their terminal state; only
    /// `last_checked_at` moves.
    pub fn apply_state(
        &mut self,
        id: &str,
        state: MigrationState,
        failure_reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<MigrationRecord> {
        if let Some(index) = self.active_migrations.iter().position(|r| r.id == id) {
            let record = &mut self.active_migrations[index];
            record.state = state;
            record.last_checked_at = Some(now);
            if failure_reason.is_some() {
                record.failure_reason = failure_reason;
            }

            if !state.is_terminal() {
                return Ok(record.clone());
            }

            let mut record = self.active_migrations.remove(index);
            record.completed_at = Some(now);
            self.migration_history.push(record.clone());
            return Ok(record);
        }

        if let Some(record) = self.migration_history.iter_mut().find(|r| r.id == id) {
            record.last_checked_at = Some(now);
            return Ok(record.clone());
        }

        Err(RepoMoveError::not_found("migration", id))
    }

    /// Looks a migration up in either set.
    pub fn find(&self, id: &str) -> Option<&MigrationRecord> {
        self.active_migrations
            .iter()
            .chain(self.migration_history.iter())
            .find(|r| r.id == id)
    }

    /// Returns the newest `limit` history entries, oldest first.
    pub fn history_tail(&self, limit: Option<usize>) -> Vec<MigrationRecord> {
        let skip = limit
            .map(|limit| self.migration_history.len().saturating_sub(limit))
            .unwrap_or(0);
        self.migration_history[skip..].to_vec()
    }

    pub fn source_id(&self, origin_org_url: &str) -> Option<&str> {
        self.migration_sources.get(origin_org_url).map(String::as_str)
    }

    /// Records a source alias. An existing alias is permanent and is kept;
    /// returns whether the mapping was newly inserted.
    pub fn insert_source(&mut self, origin_org_url: &str, source_id: &str) -> bool {
        if self.migration_sources.contains_key(origin_org_url) {
            return false;
        }
        self.migration_sources
            .insert(origin_org_url.to_string(), source_id.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::PlatformKind;

    fn record(id: &str) -> MigrationRecord {
        MigrationRecord::queued(id, "orgX", "orgY", format!("repo-{}", id), PlatformKind::GitHub)
    }

    fn contains(list: &[MigrationRecord], id: &str) -> bool {
        list.iter().any(|r| r.id == id)
    }

    #[test]
    fn test_terminal_state_promotes_to_history() {
        let mut root = MigrationStateRoot::new();
        root.insert_new(record("m-1")).unwrap();

        let now = Utc::now();
        let updated = root
            .apply_state("m-1", MigrationState::Succeeded, None, now)
            .unwrap();

        assert_eq!(updated.completed_at, Some(now));
        assert!(root.active_migrations.is_empty());
        assert_eq!(root.migration_history.len(), 1);
        assert_eq!(root.migration_history[0].state, MigrationState::Succeeded);
    }

    #[test]
    fn test_non_terminal_update_stays_active() {
        let mut root = MigrationStateRoot::new();
        root.insert_new(record("m-1")).unwrap();

        root.apply_state("m-1", MigrationState::InProgress, None, Utc::now())
            .unwrap();
        root.apply_state("m-1", MigrationState::InProgress, None, Utc::now())
            .unwrap();

        assert_eq!(root.active_migrations.len(), 1);
        assert_eq!(root.active_migrations[0].state, MigrationState::InProgress);
        assert!(root.active_migrations[0].last_checked_at.is_some());
        assert!(root.migration_history.is_empty());
    }

    #[test]
    fn test_history_record_never_returns_to_active() {
        let mut root = MigrationStateRoot::new();
        root.insert_new(record("m-1")).unwrap();
        let done_at = Utc::now();
        root.apply_state("m-1", MigrationState::Failed, Some("boom".into()), done_at)
            .unwrap();

        let again = root
            .apply_state("m-1", MigrationState::InProgress, None, Utc::now())
            .unwrap();

        assert_eq!(again.state, MigrationState::Failed);
        assert_eq!(again.completed_at, Some(done_at));
        assert_eq!(again.failure_reason.as_deref(), Some("boom"));
        assert!(!contains(&root.active_migrations, "m-1"));
        assert_eq!(root.migration_history.len(), 1);
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let mut root = MigrationStateRoot::new();
        let err = root
            .apply_state("missing", MigrationState::Queued, None, Utc::now())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_duplicate_insert_conflicts() {
        let mut root = MigrationStateRoot::new();
        root.insert_new(record("m-1")).unwrap();
        assert!(root.insert_new(record("m-1")).unwrap_err().is_conflict());
    }

    #[test]
    fn test_history_tail_keeps_insertion_order() {
        let mut root = MigrationStateRoot::new();
        for id in ["a", "b", "c"] {
            root.insert_new(record(id)).unwrap();
            root.apply_state(id, MigrationState::Succeeded, None, Utc::now())
                .unwrap();
        }

        let ids: Vec<_> = root.history_tail(Some(2)).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(root.history_tail(None).len(), 3);
        assert_eq!(root.history_tail(Some(10)).len(), 3);
    }

    #[test]
    fn test_source_alias_is_permanent() {
        let mut root = MigrationStateRoot::new();
        assert!(root.insert_source("https://github.com/orgX", "MS_1"));
        assert!(!root.insert_source("https://github.com/orgX", "MS_2"));
        assert_eq!(root.source_id("https://github.com/orgX"), Some("MS_1"));
    }
}
