//! Migration domain module.
//!
//! # Module Structure
//!
//! - `model`: Core migration models (`MigrationState`, `MigrationRecord`, `MigrationStatus`, ...)
//! - `state`: Persisted root and its active → history transition rules
//! - `provider`: Trait for the external migration API
//! - `repository`: Trait for migration state persistence
//!
//! # Usage
//!
//! ```ignore
//! use repomove_core::migration::{MigrationRecord, MigrationState, MigrationStateRoot};
//! use repomove_core::migration::{MigrationProvider, MigrationStateRepository};
//! ```

mod model;
pub mod provider;
pub mod repository;
mod state;

// Re-export public API
pub use model::{
    MigrationRecord, MigrationState, MigrationStatus, PlatformKind, WaitOutcome,
};
pub use provider::MigrationProvider;
pub use repository::MigrationStateRepository;
pub use state::MigrationStateRoot;
