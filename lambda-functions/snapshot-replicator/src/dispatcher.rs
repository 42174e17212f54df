use aws_config::BehaviorVersion;
use std::sync::Arc;
use tracing::{info, warn};

use crate::cluster::ClusterEngine;
use crate::config::ReplicatorConfig;
use crate::error::ReplicatorError;
use crate::event::{DetailType, EventCategory, Response, SnapshotEvent};
use crate::instance::InstanceEngine;
use crate::notify::{Notifier, SnsNotifier};
use crate::policy::{Outcome, PolicyContext, SkipReason};
use crate::rds::{RdsSnapshotManager, SnapshotManager};

/// One invocation's worth of collaborators.
pub struct SnapshotReplicatorService {
    pub config: Arc<ReplicatorConfig>,
    pub source: Arc<dyn SnapshotManager>,
    pub target: Arc<dyn SnapshotManager>,
    pub notifier: Arc<dyn Notifier>,
}

impl SnapshotReplicatorService {
    /// Builds RDS clients for the event's region and `dest_region`, plus the
    /// SNS notifier, from one loaded AWS configuration.
    pub async fn new(config: Arc<ReplicatorConfig>, source_region: &str) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest()).load().await;

        let source = RdsSnapshotManager::for_region(&shared, source_region);
        let target = RdsSnapshotManager::for_region(&shared, &config.dest_region);
        let notifier = SnsNotifier::new(&shared, config.sns_topic_arn.clone());

        Self {
            config,
            source: Arc::new(source),
            target: Arc::new(target),
            notifier: Arc::new(notifier),
        }
    }

    pub fn with_collaborators(
        config: Arc<ReplicatorConfig>,
        source: Arc<dyn SnapshotManager>,
        target: Arc<dyn SnapshotManager>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            source,
            target,
            notifier,
        }
    }

    fn context(&self) -> PolicyContext<'_> {
        PolicyContext {
            config: &self.config,
            source: self.source.as_ref(),
            target: self.target.as_ref(),
            notifier: self.notifier.as_ref(),
        }
    }

    /// Routes on event category and detail type.
    ///
    /// Combinations outside the routing table are acknowledged without action.
    pub async fn dispatch(&self, event: &SnapshotEvent) -> Result<Outcome, ReplicatorError> {
        let category = event.category();
        let ctx = self.context();

        info!(
            "Received {} event {:?} for {}: {}",
            category, event.detail_type, event.detail.source_identifier, event.detail.message
        );

        match (category, event.detail_type) {
            (EventCategory::Creation | EventCategory::Backup, DetailType::InstanceSnapshot) => {
                InstanceEngine::new(ctx).copy_instance_snapshot(event).await
            }
            (EventCategory::Creation | EventCategory::Backup, DetailType::ClusterSnapshot) => {
                ClusterEngine::new(ctx).copy_cluster_snapshot(event).await
            }
            (EventCategory::Deletion, _) => {
                InstanceEngine::new(ctx).delete_instance_snapshot(event).await
            }
            (category, detail_type) => {
                warn!(
                    "No action for event category {} with detail type {:?}",
                    category, detail_type
                );
                Ok(Outcome::Skipped(SkipReason::Unrouted {
                    category,
                    detail_type,
                }))
            }
        }
    }

    pub async fn handle_event(&self, event: &SnapshotEvent) -> Result<Response, ReplicatorError> {
        let outcome = self.dispatch(event).await?;
        info!("{}", outcome);
        Ok(Response::ok(outcome.to_string()))
    }
}
