use tracing::{info, warn};

use crate::event::SnapshotEvent;
use crate::notify::Notifier;
use crate::rds::SnapshotManager;
use crate::snapshot::{SnapshotKind, SnapshotType, SourceSnapshotInfo};

/// Lifecycle phase carried by an RDS snapshot event message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagePhase {
    /// Snapshot exists but is not yet available.
    Creating,
    Created(SnapshotType),
    Deleted(SnapshotType),
    Other,
}

pub fn classify_message(kind: SnapshotKind, message: &str) -> MessagePhase {
    match (kind, message) {
        (SnapshotKind::Instance, "Creating automated snapshot" | "Creating manual snapshot") => {
            MessagePhase::Creating
        }
        (
            SnapshotKind::Cluster,
            "Creating automated cluster snapshot" | "Creating manual cluster snapshot",
        ) => MessagePhase::Creating,
        (SnapshotKind::Instance, "Automated snapshot created")
        | (SnapshotKind::Cluster, "Automated cluster snapshot created") => {
            MessagePhase::Created(SnapshotType::Automated)
        }
        (SnapshotKind::Instance, "Manual snapshot created")
        | (SnapshotKind::Cluster, "Manual cluster snapshot created") => {
            MessagePhase::Created(SnapshotType::Manual)
        }
        (_, "Deleted automated snapshot" | "Deleted automated cluster snapshot") => {
            MessagePhase::Deleted(SnapshotType::Automated)
        }
        (_, "Deleted manual snapshot" | "Deleted manual cluster snapshot") => {
            MessagePhase::Deleted(SnapshotType::Manual)
        }
        _ => MessagePhase::Other,
    }
}

pub fn snapshot_type(kind: SnapshotKind, message: &str) -> SnapshotType {
    match classify_message(kind, message) {
        MessagePhase::Created(snapshot_type) | MessagePhase::Deleted(snapshot_type) => {
            snapshot_type
        }
        MessagePhase::Creating | MessagePhase::Other => SnapshotType::Other,
    }
}

/// Builds [`SourceSnapshotInfo`] for an event, looking up owner and encryption
/// in the source region for "created" messages.
pub struct SourceResolver<'a> {
    source: &'a dyn SnapshotManager,
    notifier: &'a dyn Notifier,
}

impl<'a> SourceResolver<'a> {
    pub fn new(source: &'a dyn SnapshotManager, notifier: &'a dyn Notifier) -> Self {
        Self { source, notifier }
    }

    /// Never fails. A failed lookup is notified and leaves the owner empty and
    /// the encryption state unknown.
    pub async fn resolve(&self, kind: SnapshotKind, event: &SnapshotEvent) -> SourceSnapshotInfo {
        let detail = &event.detail;
        let phase = classify_message(kind, &detail.message);

        let mut info = SourceSnapshotInfo {
            kind,
            source_snapshot_arn: detail.source_arn.clone(),
            source_snapshot_identifier: detail.source_identifier.clone(),
            owner_identifier: String::new(),
            message: detail.message.clone(),
            event_category: event.category_label().to_string(),
            snapshot_type: snapshot_type(kind, &detail.message),
            is_encrypted: None,
        };

        if let MessagePhase::Created(_) = phase {
            match self
                .source
                .describe_snapshot(kind, &detail.source_identifier)
                .await
            {
                Ok(description) => {
                    info!(
                        "Resolved {} snapshot {} to owner {} (encrypted: {})",
                        kind,
                        detail.source_identifier,
                        description.owner_identifier,
                        description.encrypted
                    );
                    info.owner_identifier = description.owner_identifier;
                    info.is_encrypted = Some(description.encrypted);
                }
                Err(e) => {
                    warn!(
                        "Failed to resolve owner of {} snapshot {} in {}: {}",
                        kind, detail.source_identifier, event.region, e
                    );
                    self.notifier.notify(&e.to_string()).await;
                }
            }
        }

        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_messages() {
        let kind = SnapshotKind::Instance;
        assert_eq!(classify_message(kind, "Creating automated snapshot"), MessagePhase::Creating);
        assert_eq!(classify_message(kind, "Creating manual snapshot"), MessagePhase::Creating);
        assert_eq!(snapshot_type(kind, "Automated snapshot created"), SnapshotType::Automated);
        assert_eq!(snapshot_type(kind, "Manual snapshot created"), SnapshotType::Manual);
        assert_eq!(snapshot_type(kind, "Deleted automated snapshot"), SnapshotType::Automated);
        assert_eq!(snapshot_type(kind, "Deleted manual snapshot"), SnapshotType::Manual);
    }

    #[test]
    fn test_cluster_messages() {
        let kind = SnapshotKind::Cluster;
        assert_eq!(
            classify_message(kind, "Creating automated cluster snapshot"),
            MessagePhase::Creating
        );
        assert_eq!(
            snapshot_type(kind, "Automated cluster snapshot created"),
            SnapshotType::Automated
        );
        assert_eq!(snapshot_type(kind, "Manual cluster snapshot created"), SnapshotType::Manual);
        assert_eq!(
            snapshot_type(kind, "Deleted automated cluster snapshot"),
            SnapshotType::Automated
        );
        assert_eq!(snapshot_type(kind, "Deleted manual snapshot"), SnapshotType::Manual);
    }

    #[test]
    fn test_unrecognised_messages_are_other() {
        for message in [
            "",
            "automated snapshot created",
            "Automated snapshot created ",
            "Snapshot restored",
            "Creating automated snapshot",
        ] {
            assert_eq!(
                snapshot_type(SnapshotKind::Instance, message),
                SnapshotType::Other,
                "{message:?}"
            );
        }
        // Messages belong to one namespace only.
        assert_eq!(
            snapshot_type(SnapshotKind::Instance, "Automated cluster snapshot created"),
            SnapshotType::Other
        );
        assert_eq!(
            classify_message(SnapshotKind::Cluster, "Creating automated snapshot"),
            MessagePhase::Other
        );
    }
}
