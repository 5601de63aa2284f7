//! Secret values and the environment they may fall back to.
//!
//! # Security Note
//!
//! A [`Secret`] never prints its content: both `Debug` and `Display` render a
//! fixed mask, so a secret that slips into a `tracing` field or an error
//! message stays hidden. Call [`Secret::expose`] only at the point where the
//! value is handed to a platform client.

use std::collections::HashMap;
use std::fmt;

/// A pre-issued platform token.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw token.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Read-only view of environment defaults.
///
/// The process environment is the production source; tests supply a map so
/// they never touch global state.
pub trait EnvSource: Send + Sync {
    /// Returns the value of `name`, treating empty values as absent.
    fn var(&self, name: &str) -> Option<String>;
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).filter(|value| !value.is_empty()).cloned()
    }
}
