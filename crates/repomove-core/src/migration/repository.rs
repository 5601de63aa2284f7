//! Migration state repository trait.
//!
//! Defines the interface for persisting migration records and migration
//! source aliases.

use async_trait::async_trait;
use std::collections::BTreeMap;

use super::model::{MigrationRecord, MigrationState};
use crate::error::Result;

/// Durable record of active and completed migrations.
///
/// Every operation is a complete read-modify-write of the persisted root.
/// Implementations must serialise those cycles so that two callers updating
/// different migrations never lose either update.
#[async_trait]
pub trait MigrationStateRepository: Send + Sync {
    /// Records a newly started migration in the active set.
    async fn record_new(&self, record: MigrationRecord) -> Result<()>;

    /// Writes a new state, promoting the record to history when it is terminal.
    ///
    /// Updating to the state a record already has only moves `last_checked_at`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `id` is in neither set.
    async fn update_state(
        &self,
        id: &str,
        state: MigrationState,
        failure_reason: Option<String>,
    ) -> Result<MigrationRecord>;

    /// Finds a migration in either set.
    async fn get(&self, id: &str) -> Result<Option<MigrationRecord>>;

    /// Lists active migrations in insertion order.
    async fn list_active(&self) -> Result<Vec<MigrationRecord>>;

    /// Lists the newest `limit` history entries (all when `None`), oldest first.
    async fn list_history(&self, limit: Option<usize>) -> Result<Vec<MigrationRecord>>;

    async fn get_source_id(&self, origin_org_url: &str) -> Result<Option<String>>;

    /// Stores a source alias. An alias that already exists is never replaced.
    async fn put_source_id(&self, origin_org_url: &str, source_id: &str) -> Result<()>;

    async fn list_sources(&self) -> Result<BTreeMap<String, String>>;
}
