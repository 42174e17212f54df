use tracing::{info, warn};

use crate::cluster::ClusterEngine;
use crate::error::{ReplicatorError, SnapshotApiError};
use crate::event::SnapshotEvent;
use crate::policy::{Outcome, PolicyContext, SkipReason};
use crate::resolver::{classify_message, MessagePhase, SourceResolver};
use crate::snapshot::{CopySnapshotRequest, SnapshotKind, SnapshotType, SourceSnapshotInfo};

const KIND: SnapshotKind = SnapshotKind::Instance;

/// Copy, delete and retention policy for RDS DB instance snapshots.
pub struct InstanceEngine<'a> {
    ctx: PolicyContext<'a>,
}

impl<'a> InstanceEngine<'a> {
    pub fn new(ctx: PolicyContext<'a>) -> Self {
        Self { ctx }
    }

    async fn resolve(&self, event: &SnapshotEvent) -> SourceSnapshotInfo {
        SourceResolver::new(self.ctx.source, self.ctx.notifier)
            .resolve(KIND, event)
            .await
    }

    /// KMS key for the copy. Only an unencrypted source without the encryption
    /// override is copied without one; an unknown state gets the key.
    fn copy_kms_key(&self, info: &SourceSnapshotInfo) -> Option<String> {
        if info.is_encrypted == Some(false) && !self.ctx.config.encrypt_instance_snapshots {
            None
        } else {
            Some(self.ctx.config.kms_key_id.clone())
        }
    }

    pub async fn copy_instance_snapshot(
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

        if !self.ctx.config.is_instance_allowed(&info.owner_identifier) {
            info!(
                "Instance {:?} is not in rds_instances list, skip snapshot {}",
                info.owner_identifier, info.source_snapshot_identifier
            );
            return Ok(Outcome::Skipped(SkipReason::NotAllowListed {
                kind: KIND,
                owner: info.owner_identifier,
            }));
        }

        let target = info.target_snapshot_identifier();
        let request = CopySnapshotRequest {
            source_snapshot_arn: info.source_snapshot_arn.clone(),
            target_snapshot_identifier: target.clone(),
            source_region: event.region.clone(),
            tags: info.copy_tags(),
            copy_tags: true,
            kms_key_id: self.copy_kms_key(&info),
        };

        info!(
            "Copying instance snapshot {} to {} in {} (encrypted copy: {})",
            info.source_snapshot_arn,
            target,
            self.ctx.config.dest_region,
            request.kms_key_id.is_some()
        );

        if let Err(cause) = self.ctx.target.copy_snapshot(KIND, &request).await {
            warn!("Failed to copy instance snapshot {}: {}", info.source_snapshot_arn, cause);
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

    /// Deletes the destination copy of a deleted source snapshot. A copy absent
    /// from the instance namespace is retried as a cluster snapshot.
    pub async fn delete_instance_snapshot(
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

        match self.ctx.target.delete_snapshot(KIND, &target).await {
            Ok(()) => {
                info!("Deleted instance snapshot copy {}", target);
                Ok(Outcome::Deleted { kind: KIND, target })
            }
            Err(SnapshotApiError::NotFound(_)) => {
                info!(
                    "Instance snapshot {} not found, retrying as cluster snapshot",
                    target
                );
                ClusterEngine::new(self.ctx)
                    .delete_cluster_snapshot(event)
                    .await
            }
            Err(cause) => {
                warn!("Failed to delete instance snapshot {}: {}", target, cause);
                Err(self
                    .ctx
                    .fail(ReplicatorError::Delete {
                        kind: KIND,
                        target,
                        cause,
                    })
                    .await)
            }
        }
    }
}
