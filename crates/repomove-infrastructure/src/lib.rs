pub mod config_service;
pub mod env;
pub mod paths;
pub mod state_store;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::env::ProcessEnv;
pub use crate::state_store::MigrationStateStore;
