use tracing::{info, warn};

use crate::error::ReplicatorError;
use crate::event::SnapshotEvent;
use crate::policy::{Outcome, PolicyContext, SkipReason};
use crate::resolver::{classify_message, MessagePhase, SourceResolver};
use crate::snapshot::{CopySnapshotRequest, SnapshotKind, SnapshotType, SourceSnapshotInfo};

const KIND: SnapshotKind = SnapshotKind::Cluster;

/// Copy, delete and retention policy for Aurora / Multi-AZ cluster snapshots.
pub struct ClusterEngine<'a> {
    ctx: PolicyContext<'a>,
}

impl<'a> ClusterEngine<'a> {
    pub fn new(ctx: PolicyContext<'a>) -> Self {
        Self { ctx }
    }

    async fn resolve(&self, event: &SnapshotEvent) -> SourceSnapshotInfo {
        SourceResolver::new(self.ctx.source, self.ctx.notifier)
            .resolve(KIND, event)
            .await
    }

    pub async fn copy_cluster_snapshot(
        &self,
        event: &SnapshotEvent,
    ) -> Result<Outcome, ReplicatorError> {
        if classify_message(KIND, &event.detail.message) == MessagePhase::Creating {
            info!("Snapshot {} is not in available state", event.detail.source_identifier);
            return Ok(Outcome::Skipped(SkipReason::NotAvailable {
                snapshot: event.detail.source_identifier.clone(),
            }));
        }

        let info = self.resolve(event).await;

        if !self.ctx.config.is_cluster_allowed(&info.owner_identifier) {
            info!(
                "Cluster {:?} is not in rds_clusters list, skip snapshot {}",
                info.owner_identifier, info.source_snapshot_identifier
            );
            return Ok(Outcome::Skipped(SkipReason::NotAllowListed {
                kind: KIND,
                owner: info.owner_identifier,
            }));
        }

        // Unencrypted cluster copies take no key; encrypted cross-region
        // copies must name one in the destination region.
        let kms_key_id = match info.is_encrypted {
            Some(true) => Some(self.ctx.config.kms_key_id.clone()),
            _ => None,
        };

        let target = info.target_snapshot_identifier();
        let request = CopySnapshotRequest {
            source_snapshot_arn: info.source_snapshot_arn.clone(),
            target_snapshot_identifier: target.clone(),
            source_region: event.region.clone(),
            tags: info.copy_tags(),
            copy_tags: true,
            kms_key_id,
        };

        info!(
            "Copying cluster snapshot {} to {} in {} (encrypted source: {})",
            info.source_snapshot_arn,
            target,
            self.ctx.config.dest_region,
            request.kms_key_id.is_some()
        );

        if let Err(cause) = self.ctx.target.copy_snapshot(KIND, &request).await {
            warn!("Failed to copy cluster snapshot {}: {}", info.source_snapshot_arn, cause);
            return Err(self
                .ctx
                .fail(ReplicatorError::Copy {
                    kind: KIND,
                    source_arn: info.source_snapshot_arn,
                    target,
                    cause,
                })
                .await);
        }

        let pruned = if info.snapshot_type == SnapshotType::Automated {
            self.ctx
                .prune_automated_copies(KIND, &info.owner_identifier)
                .await?
        } else {
            info!("Manual snapshot: skip clean copies of automated snapshot");
            Vec::new()
        };

        Ok(Outcome::Copied {
            kind: KIND,
            target,
            pruned,
        })
    }

    pub async fn delete_cluster_snapshot(
        &self,
        event: &SnapshotEvent,
    ) -> Result<Outcome, ReplicatorError> {
        let info = self.resolve(event).await;
        let target = info.target_snapshot_identifier();

        match info.snapshot_type {
            SnapshotType::Other => {
                info!("Skip delete of other snapshot {}", info.source_snapshot_identifier);
                return Ok(Outcome::Skipped(SkipReason::UnmanagedSnapshotType {
                    snapshot: info.source_snapshot_identifier,
                }));
            }
            SnapshotType::Manual if !self.ctx.config.delete_manual_snapshots => {
                info!("Skip delete of manual snapshot {}", info.source_snapshot_identifier);
                return Ok(Outcome::Skipped(SkipReason::ManualDeletionDisabled {
                    snapshot: info.source_snapshot_identifier,
                }));
            }
            _ => {}
        }

        if let Err(cause) = self.ctx.target.delete_snapshot(KIND, &target).await {
            warn!("Failed to delete cluster snapshot {}: {}", target, cause);
            return Err(self
                .ctx
                .fail(ReplicatorError::Delete {
                    kind: KIND,
                    target,
                    cause,
                })
                .await);
        }

        info!("Deleted cluster snapshot copy {}", target);
        Ok(Outcome::Deleted { kind: KIND, target })
    }
}
