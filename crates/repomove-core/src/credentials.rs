//! Session-scoped credentials.

use crate::config::{CredentialNames, SecretSourceNames};
use crate::secret::Secret;
use std::collections::HashMap;
use std::fmt;

/// The kinds of secret a call may need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    /// Token for the platform repositories move from.
    Origin,
    /// Token for the platform repositories move to.
    Target,
    /// Token for the secondary origin platform.
    Secondary,
}

impl CredentialKind {
    pub fn label(&self) -> &'static str {
        match self {
            CredentialKind::Origin => "origin platform token",
            CredentialKind::Target => "target platform token",
            CredentialKind::Secondary => "secondary platform token",
        }
    }

    /// Lookup names for this kind.
    pub fn names<'a>(&self, names: &'a CredentialNames) -> &'a SecretSourceNames {
        match self {
            CredentialKind::Origin => &names.origin,
            CredentialKind::Target => &names.target,
            CredentialKind::Secondary => &names.secondary,
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Secrets supplied by one connection.
///
/// Lives only in memory, for exactly as long as the connection that supplied it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCredentials {
    pub origin: Option<Secret>,
    pub target: Option<Secret>,
    pub secondary: Option<Secret>,
}

impl SessionCredentials {
    /// Parses credentials from a connection request.
    ///
    /// Header names match case-insensitively and take precedence over query
    /// parameters. Empty values are ignored.
    pub fn from_request(
        headers: &HashMap<String, String>,
        query: &HashMap<String, String>,
        names: &CredentialNames,
    ) -> Self {
        let pick = |kind: CredentialKind| {
            let source = kind.names(names);
            headers
                .iter()
                .find(|(key, value)| key.eq_ignore_ascii_case(&source.header) && !value.is_empty())
                .map(|(_, value)| value.clone())
                .or_else(|| query.get(&source.query).filter(|v| !v.is_empty()).cloned())
                .map(Secret::new)
        };

        Self {
            origin: pick(CredentialKind::Origin),
            target: pick(CredentialKind::Target),
            secondary: pick(CredentialKind::Secondary),
        }
    }

    pub fn get(&self, kind: CredentialKind) -> Option<&Secret> {
        match kind {
            CredentialKind::Origin => self.origin.as_ref(),
            CredentialKind::Target => self.target.as_ref(),
            CredentialKind::Secondary => self.secondary.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.origin.is_none() && self.target.is_none() && self.secondary.is_none()
    }
}
