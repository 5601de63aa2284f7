//! Application layer for repomove.
//!
//! This crate coordinates the domain traits from `repomove-core`: per-session
//! credential resolution, migration source registration, and the migration
//! lifecycle.

pub mod lifecycle;
pub mod session;
pub mod source_cache;
pub mod usecase;

#[cfg(test)]
mod test_support;

pub use lifecycle::{AbortOutcome, MigrationLifecycleController, StartMigration};
pub use session::{CredentialResolver, SessionCredentialRegistry};
pub use source_cache::MigrationSourceCache;
pub use usecase::{MigrationUseCase, StartRepositoryMigration};
