//! Cross-region replication of RDS instance and cluster snapshots, driven by
//! RDS snapshot events, with retention of automated copies in the destination
//! region.

pub mod cluster;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod instance;
pub mod notify;
pub mod policy;
pub mod rds;
pub mod resolver;
pub mod snapshot;

pub use config::ReplicatorConfig;
pub use dispatcher::SnapshotReplicatorService;
pub use error::{ConfigError, ReplicatorError, SnapshotApiError};
pub use event::{DetailType, EventCategory, EventDetail, Response, SnapshotEvent};
pub use notify::Notifier;
pub use policy::{Outcome, PolicyContext, SkipReason};
pub use rds::SnapshotManager;
pub use snapshot::{
    target_snapshot_identifier, CopySnapshotRequest, DestinationSnapshot, SnapshotDescription,
    SnapshotKind, SnapshotTag, SnapshotType, SourceSnapshotInfo,
};
