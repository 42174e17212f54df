use std::fmt;
use tracing::{info, warn};

use crate::config::ReplicatorConfig;
use crate::error::{ReplicatorError, SnapshotApiError};
use crate::event::{DetailType, EventCategory};
use crate::notify::Notifier;
use crate::rds::SnapshotManager;
use crate::snapshot::{sort_newest_first, stale_copies, RetentionCandidate, SnapshotKind};

/// Collaborators shared by the instance and cluster engines for one invocation.
#[derive(Clone, Copy)]
pub struct PolicyContext<'a> {
    pub config: &'a ReplicatorConfig,
    /// Region the event was raised in.
    pub source: &'a dyn SnapshotManager,
    /// `dest_region`, where copies live.
    pub target: &'a dyn SnapshotManager,
    pub notifier: &'a dyn Notifier,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Copied {
        kind: SnapshotKind,
        target: String,
        pruned: Vec<String>,
    },
    Deleted {
        kind: SnapshotKind,
        target: String,
    },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The snapshot is still being created; a later event will carry it.
    NotAvailable { snapshot: String },
    NotAllowListed { kind: SnapshotKind, owner: String },
    UnmanagedSnapshotType { snapshot: String },
    ManualDeletionDisabled { snapshot: String },
    Unrouted {
        category: EventCategory,
        detail_type: DetailType,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAvailable { snapshot } => {
                write!(f, "snapshot {} is not in available state", snapshot)
            }
            Self::NotAllowListed {
                kind: SnapshotKind::Instance,
                owner,
            } => write!(f, "instance {} is not in rds_instances list", owner),
            Self::NotAllowListed {
                kind: SnapshotKind::Cluster,
                owner,
            } => write!(f, "cluster {} is not in rds_clusters list", owner),
            Self::UnmanagedSnapshotType { snapshot } => {
                write!(f, "skip delete of other snapshot {}", snapshot)
            }
            Self::ManualDeletionDisabled { snapshot } => {
                write!(f, "skip delete of manual snapshot {}", snapshot)
            }
            Self::Unrouted {
                category,
                detail_type,
            } => write!(
                f,
                "no action for event category {} with detail type {:?}",
                category, detail_type
            ),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copied { kind, target, pruned } => write!(
                f,
                "SUCCEEDED: copied RDS {} snapshot to {} ({} stale copies pruned)",
                kind,
                target,
                pruned.len()
            ),
            Self::Deleted { kind, target } => {
                write!(f, "SUCCEEDED: deleted RDS {} snapshot {}", kind, target)
            }
            Self::Skipped(reason) => write!(f, "SKIPPED: {}", reason),
        }
    }
}

impl<'a> PolicyContext<'a> {
    /// Notifies the operator, then hands the error back for propagation.
    pub(crate) async fn fail(&self, err: ReplicatorError) -> ReplicatorError {
        self.notifier.notify(&err.to_string()).await;
        err
    }

    /// Deletes automated copies of `owner` in the destination region beyond
    /// `maximum_copies`, returning the identifiers removed.
    ///
    /// Two concurrent invocations for the same owner can both list before
    /// either deletes, so more copies than necessary may be removed.
    pub async fn prune_automated_copies(
        &self,
        kind: SnapshotKind,
        owner: &str,
    ) -> Result<Vec<String>, ReplicatorError> {
        let maximum_copies = self.config.maximum_copies;
        if maximum_copies == 0 {
            info!("Retention disabled, skip cleaning {} snapshots of {}", kind, owner);
            return Ok(Vec::new());
        }

        let prune_error = |cause: SnapshotApiError| ReplicatorError::Prune {
            kind,
            owner: owner.to_string(),
            cause,
        };

        let candidates = match self.automated_copies(kind, owner).await {
            Ok(candidates) => candidates,
            Err(cause) => return Err(self.fail(prune_error(cause)).await),
        };

        let stale = stale_copies(&candidates, maximum_copies);
        info!(
            "Found {} automated {} copies of {}, removing {}",
            candidates.len(),
            kind,
            owner,
            stale.len()
        );

        let mut pruned = Vec::with_capacity(stale.len());
        for candidate in stale {
            let target = &candidate.target_snapshot_identifier;
            if let Err(cause) = self.target.delete_snapshot(kind, target).await {
                warn!("Failed to delete stale {} copy {}: {}", kind, target, cause);
                return Err(self
                    .fail(ReplicatorError::Delete {
                        kind,
                        target: target.clone(),
                        cause,
                    })
                    .await);
            }
            info!("Deleted stale {} copy {}", kind, target);
            pruned.push(target.clone());
        }

        Ok(pruned)
    }

    /// Destination copies tagged as automated, newest first. Copies still being
    /// created have no creation time and are ignored.
    async fn automated_copies(
        &self,
        kind: SnapshotKind,
        owner: &str,
    ) -> Result<Vec<RetentionCandidate>, SnapshotApiError> {
        let mut candidates = Vec::new();

        for snapshot in self.target.list_snapshots(kind, owner).await? {
            let Some(created_at) = snapshot.created_at else {
                continue;
            };

            let tags = self.target.list_tags(&snapshot.arn).await?;
            if tags.iter().any(|tag| tag.marks_automated_copy()) {
                candidates.push(RetentionCandidate {
                    target_snapshot_identifier: snapshot.identifier,
                    created_at,
                });
            }
        }

        sort_newest_first(&mut candidates);
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_allow_listed_wording() {
        let reason = SkipReason::NotAllowListed {
            kind: SnapshotKind::Instance,
            owner: "reports-db".to_string(),
        };
        assert_eq!(reason.to_string(), "instance reports-db is not in rds_instances list");

        let reason = SkipReason::NotAllowListed {
            kind: SnapshotKind::Cluster,
            owner: String::new(),
        };
        assert!(reason.to_string().contains("is not in rds_clusters list"));
    }

    #[test]
    fn test_outcome_body() {
        let outcome = Outcome::Copied {
            kind: SnapshotKind::Instance,
            target: "rds-orders-db-1-autocopied".to_string(),
            pruned: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(
            outcome.to_string(),
            "SUCCEEDED: copied RDS instance snapshot to rds-orders-db-1-autocopied (2 stale copies pruned)"
        );

        let skipped = Outcome::Skipped(SkipReason::Unrouted {
            category: EventCategory::Unknown,
            detail_type: DetailType::Unknown,
        });
        assert!(skipped.to_string().starts_with("SKIPPED: no action"));
    }
}
