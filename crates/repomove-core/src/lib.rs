pub mod config;
pub mod credentials;
pub mod error;
pub mod migration;
pub mod secret;

// Re-export common types
pub use error::{ErrorReport, RepoMoveError, Result};
pub use secret::{EnvSource, Secret};
