//! Session-scoped credential handling.
//!
//! - `registry`: per-connection credential store (`SessionCredentialRegistry`)
//! - `resolver`: session-first secret resolution with environment fallback (`CredentialResolver`)

mod registry;
mod resolver;

pub use registry::SessionCredentialRegistry;
pub use resolver::CredentialResolver;
