//! Migration provider trait.
//!
//! Defines the operations the control plane consumes from the target
//! platform's migration API. Request bodies, transport and retry policy belong
//! to the implementation.

use async_trait::async_trait;

use super::model::{MigrationStatus, PlatformKind};
use crate::error::Result;
use crate::secret::Secret;

/// External asynchronous migration operation.
///
/// Every call is authenticated with the caller's resolved target token, so a
/// single provider instance serves many tenants at once.
///
/// # Errors
///
/// Implementations surface platform failures as
/// [`RepoMoveError::ExternalApi`](crate::error::RepoMoveError::ExternalApi)
/// and must not retry on the core's behalf.
#[async_trait]
pub trait MigrationProvider: Send + Sync {
    /// Registers `origin_org_url` as a migration source for the target organization.
    async fn create_migration_source(
        &self,
        auth: &Secret,
        target_org_id: &str,
        origin_org_url: &str,
        platform: PlatformKind,
    ) -> Result<String>;

    /// Starts a repository migration and returns the provider's migration ID.
    async fn start_migration(
        &self,
        auth: &Secret,
        source_id: &str,
        target_org_id: &str,
        origin_repo_url: &str,
        target_repo_name: &str,
        access_token: &Secret,
    ) -> Result<String>;

    async fn get_migration_status(
        &self,
        auth: &Secret,
        migration_id: &str,
    ) -> Result<MigrationStatus>;

    /// Requests cancellation. `Ok(false)` means the provider declined or could
    /// not confirm.
    async fn abort_migration(&self, auth: &Secret, migration_id: &str) -> Result<bool>;

    /// Resolves an organization login to the provider's node ID.
    async fn resolve_organization_id(&self, auth: &Secret, org_name: &str) -> Result<String>;
}
