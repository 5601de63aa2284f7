//! Migration domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::RepoMoveError;

/// Lifecycle state of a repository migration.
///
/// `QUEUED → IN_PROGRESS → {SUCCEEDED, FAILED, FAILED_VALIDATION}`, with
/// `ABORTED` reachable from either non-terminal state by explicit cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MigrationState {
    Queued,
    InProgress,
    Succeeded,
    Failed,
    FailedValidation,
    /// Set locally when a caller cancels.
    Aborted,
}

impl MigrationState {
    /// Returns true if no further transition can occur.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MigrationState::Succeeded
                | MigrationState::Failed
                | MigrationState::FailedValidation
                | MigrationState::Aborted
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationState::Queued => "QUEUED",
            MigrationState::InProgress => "IN_PROGRESS",
            MigrationState::Succeeded => "SUCCEEDED",
            MigrationState::Failed => "FAILED",
            MigrationState::FailedValidation => "FAILED_VALIDATION",
            MigrationState::Aborted => "ABORTED",
        }
    }
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MigrationState {
    type Err = RepoMoveError;

    /// Parses the provider's state vocabulary (case-sensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "QUEUED" | "PENDING_VALIDATION" => Ok(MigrationState::Queued),
            "IN_PROGRESS" => Ok(MigrationState::InProgress),
            "SUCCEEDED" => Ok(MigrationState::Succeeded),
            "FAILED" => Ok(MigrationState::Failed),
            "FAILED_VALIDATION" => Ok(MigrationState::FailedValidation),
            "ABORTED" => Ok(MigrationState::Aborted),
            other => Err(RepoMoveError::external(
                "getMigrationStatus",
                format!("unrecognised migration state '{}'", other),
            )),
        }
    }
}

/// Origin platform a migration source is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlatformKind {
    #[serde(rename = "GITHUB_ARCHIVE")]
    GitHub,
    #[serde(rename = "AZURE_DEVOPS")]
    AzureDevOps,
    #[serde(rename = "BITBUCKET_SERVER")]
    BitbucketServer,
}

impl PlatformKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformKind::GitHub => "GITHUB_ARCHIVE",
            PlatformKind::AzureDevOps => "AZURE_DEVOPS",
            PlatformKind::BitbucketServer => "BITBUCKET_SERVER",
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Locally recorded migration.
///
/// A record lives in exactly one of the active or history sets. It moves to
/// history exactly once, when its state becomes terminal, and `completed_at`
/// is stamped at that moment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationRecord {
    /// Provider-assigned migration ID
    pub id: String,
    /// Organization the repository moves from
    pub origin_org: String,
    /// Organization the repository moves to
    pub target_org: String,
    /// Final repository name on the target
    pub repository_name: String,
    pub state: MigrationState,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub platform: PlatformKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    /// Last time the state was written, including no-op refreshes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl MigrationRecord {
    /// Creates a freshly started record in `QUEUED`.
    pub fn queued(
        id: impl Into<String>,
        origin_org: impl Into<String>,
        target_org: impl Into<String>,
        repository_name: impl Into<String>,
        platform: PlatformKind,
    ) -> Self {
        Self {
            id: id.into(),
            origin_org: origin_org.into(),
            target_org: target_org.into(),
            repository_name: repository_name.into(),
            state: MigrationState::Queued,
            started_at: Utc::now(),
            completed_at: None,
            platform,
            failure_reason: None,
            last_checked_at: None,
        }
    }
}

/// Status reported by the provider for one migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationStatus {
    pub id: String,
    pub state: MigrationState,
    pub repository_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

/// Result of a bounded wait on a migration.
///
/// `completed == false` is a normal outcome: the wait ran out (or was
/// cancelled) and the remote migration was left running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitOutcome {
    pub completed: bool,
    pub final_state: Option<MigrationState>,
    /// Last state observed, terminal or not.
    pub last_state: Option<MigrationState>,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
    pub polls: u32,
    pub cancelled: bool,
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }
}
