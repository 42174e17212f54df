use thiserror::Error;

use crate::snapshot::SnapshotKind;

/// Failure reported by a [`crate::rds::SnapshotManager`] call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotApiError {
    /// The addressed snapshot does not exist in the queried namespace.
    #[error("snapshot not found: {0}")]
    NotFound(String),

    #[error("snapshot service error: {0}")]
    Service(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {name}: expected {expected}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Fatal outcome of a single invocation. The operator has already been notified
/// by the time one of these reaches the dispatcher.
#[derive(Error, Debug)]
pub enum ReplicatorError {
    #[error("failed to copy {kind} snapshot {source_arn} to {target}: {cause}")]
    Copy {
        kind: SnapshotKind,
        source_arn: String,
        target: String,
        cause: SnapshotApiError,
    },

    #[error("failed to delete {kind} snapshot {target}: {cause}")]
    Delete {
        kind: SnapshotKind,
        target: String,
        cause: SnapshotApiError,
    },

    #[error("failed to prune automated {kind} copies of {owner}: {cause}")]
    Prune {
        kind: SnapshotKind,
        owner: String,
        cause: SnapshotApiError,
    },
}
