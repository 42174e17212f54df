use async_trait::async_trait;
use aws_config::{Region, SdkConfig};
use aws_sdk_rds::error::DisplayErrorContext;
use aws_sdk_rds::primitives::DateTime as AwsDateTime;
use aws_sdk_rds::types::Tag;
use aws_sdk_rds::Client as RdsClient;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::SnapshotApiError;
use crate::snapshot::{
    CopySnapshotRequest, DestinationSnapshot, SnapshotDescription, SnapshotKind, SnapshotTag,
};

/// Snapshot operations against a single region.
#[async_trait]
pub trait SnapshotManager: Send + Sync {
    /// Owner and encryption state of one snapshot.
    async fn describe_snapshot(
        &self,
        kind: SnapshotKind,
        snapshot_identifier: &str,
    ) -> Result<SnapshotDescription, SnapshotApiError>;

    async fn copy_snapshot(
        &self,
        kind: SnapshotKind,
        request: &CopySnapshotRequest,
    ) -> Result<(), SnapshotApiError>;

    /// Fails with [`SnapshotApiError::NotFound`] when the identifier does not
    /// exist in the `kind` namespace.
    async fn delete_snapshot(
        &self,
        kind: SnapshotKind,
        snapshot_identifier: &str,
    ) -> Result<(), SnapshotApiError>;

    /// All snapshots belonging to an instance or cluster.
    async fn list_snapshots(
        &self,
        kind: SnapshotKind,
        owner_identifier: &str,
    ) -> Result<Vec<DestinationSnapshot>, SnapshotApiError>;

    async fn list_tags(&self, resource_arn: &str) -> Result<Vec<SnapshotTag>, SnapshotApiError>;
}

pub struct RdsSnapshotManager {
    client: RdsClient,
    region: String,
}

impl RdsSnapshotManager {
    /// Client for `region`, sharing credentials and settings with `shared`.
    pub fn for_region(shared: &SdkConfig, region: &str) -> Self {
        let config = shared
            .to_builder()
            .region(Region::new(region.to_string()))
            .build();

        Self {
            client: RdsClient::new(&config),
            region: region.to_string(),
        }
    }
}

fn service_error<E>(err: E) -> SnapshotApiError
where
    E: std::error::Error,
{
    SnapshotApiError::Service(DisplayErrorContext(err).to_string())
}

fn to_chrono(time: &AwsDateTime) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(time.secs(), time.subsec_nanos())
}

fn to_tag(tag: &SnapshotTag) -> Tag {
    Tag::builder().key(&tag.key).value(&tag.value).build()
}

#[async_trait]
impl SnapshotManager for RdsSnapshotManager {
    async fn describe_snapshot(
        &self,
        kind: SnapshotKind,
        snapshot_identifier: &str,
    ) -> Result<SnapshotDescription, SnapshotApiError> {
        let description = match kind {
            SnapshotKind::Instance => {
                let output = self
                    .client
                    .describe_db_snapshots()
                    .db_snapshot_identifier(snapshot_identifier)
                    .send()
                    .await
                    .map_err(service_error)?;

                output
                    .db_snapshots()
                    .first()
                    .map(|snapshot| SnapshotDescription {
                        owner_identifier: snapshot
                            .db_instance_identifier()
                            .unwrap_or_default()
                            .to_string(),
                        encrypted: snapshot.encrypted().unwrap_or(false),
                    })
            }
            SnapshotKind::Cluster => {
                let output = self
                    .client
                    .describe_db_cluster_snapshots()
                    .db_cluster_snapshot_identifier(snapshot_identifier)
                    .send()
                    .await
                    .map_err(service_error)?;

                output
                    .db_cluster_snapshots()
                    .first()
                    .map(|snapshot| SnapshotDescription {
                        owner_identifier: snapshot
                            .db_cluster_identifier()
                            .unwrap_or_default()
                            .to_string(),
                        encrypted: snapshot.storage_encrypted().unwrap_or(false),
                    })
            }
        };

        description.ok_or_else(|| SnapshotApiError::NotFound(snapshot_identifier.to_string()))
    }

    async fn copy_snapshot(
        &self,
        kind: SnapshotKind,
        request: &CopySnapshotRequest,
    ) -> Result<(), SnapshotApiError> {
        // Outside GovCloud the copy needs no presigned URL; the source ARN names the region.
        debug!(
            "Copying {} snapshot {} from {} into {}",
            kind, request.source_snapshot_arn, request.source_region, self.region
        );

        let tags: Vec<Tag> = request.tags.iter().map(to_tag).collect();

        match kind {
            SnapshotKind::Instance => {
                self.client
                    .copy_db_snapshot()
                    .source_db_snapshot_identifier(&request.source_snapshot_arn)
                    .target_db_snapshot_identifier(&request.target_snapshot_identifier)
                    .set_tags(Some(tags))
                    .copy_tags(request.copy_tags)
                    .set_kms_key_id(request.kms_key_id.clone())
                    .send()
                    .await
                    .map_err(service_error)?;
            }
            SnapshotKind::Cluster => {
                self.client
                    .copy_db_cluster_snapshot()
                    .source_db_cluster_snapshot_identifier(&request.source_snapshot_arn)
                    .target_db_cluster_snapshot_identifier(&request.target_snapshot_identifier)
                    .set_tags(Some(tags))
                    .copy_tags(request.copy_tags)
                    .set_kms_key_id(request.kms_key_id.clone())
                    .send()
                    .await
                    .map_err(service_error)?;
            }
        }

        Ok(())
    }

    async fn delete_snapshot(
        &self,
        kind: SnapshotKind,
        snapshot_identifier: &str,
    ) -> Result<(), SnapshotApiError> {
        match kind {
            SnapshotKind::Instance => {
                self.client
                    .delete_db_snapshot()
                    .db_snapshot_identifier(snapshot_identifier)
                    .send()
                    .await
                    .map_err(|err| {
                        let not_found = err
                            .as_service_error()
                            .map(|e| e.is_db_snapshot_not_found_fault())
                            .unwrap_or(false);
                        if not_found {
                            SnapshotApiError::NotFound(snapshot_identifier.to_string())
                        } else {
                            service_error(err)
                        }
                    })?;
            }
            SnapshotKind::Cluster => {
                self.client
                    .delete_db_cluster_snapshot()
                    .db_cluster_snapshot_identifier(snapshot_identifier)
                    .send()
                    .await
                    .map_err(|err| {
                        let not_found = err
                            .as_service_error()
                            .map(|e| e.is_db_cluster_snapshot_not_found_fault())
                            .unwrap_or(false);
                        if not_found {
                            SnapshotApiError::NotFound(snapshot_identifier.to_string())
                        } else {
                            service_error(err)
                        }
                    })?;
            }
        }

        Ok(())
    }

    async fn list_snapshots(
        &self,
        kind: SnapshotKind,
        owner_identifier: &str,
    ) -> Result<Vec<DestinationSnapshot>, SnapshotApiError> {
        let mut snapshots = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let next_marker = match kind {
                SnapshotKind::Instance => {
                    let output = self
                        .client
                        .describe_db_snapshots()
                        .db_instance_identifier(owner_identifier)
                        .set_marker(marker.take())
                        .send()
                        .await
                        .map_err(service_error)?;

                    snapshots.extend(output.db_snapshots().iter().map(|snapshot| {
                        DestinationSnapshot {
                            identifier: snapshot
                                .db_snapshot_identifier()
                                .unwrap_or_default()
                                .to_string(),
                            arn: snapshot.db_snapshot_arn().unwrap_or_default().to_string(),
                            created_at: snapshot.snapshot_create_time().and_then(to_chrono),
                        }
                    }));
                    output.marker().map(str::to_string)
                }
                SnapshotKind::Cluster => {
                    let output = self
                        .client
                        .describe_db_cluster_snapshots()
                        .db_cluster_identifier(owner_identifier)
                        .set_marker(marker.take())
                        .send()
                        .await
                        .map_err(service_error)?;

                    snapshots.extend(output.db_cluster_snapshots().iter().map(|snapshot| {
                        DestinationSnapshot {
                            identifier: snapshot
                                .db_cluster_snapshot_identifier()
                                .unwrap_or_default()
                                .to_string(),
                            arn: snapshot
                                .db_cluster_snapshot_arn()
                                .unwrap_or_default()
                                .to_string(),
                            created_at: snapshot.snapshot_create_time().and_then(to_chrono),
                        }
                    }));
                    output.marker().map(str::to_string)
                }
            };

            match next_marker {
                Some(next) if !next.is_empty() => marker = Some(next),
                _ => break,
            }
        }

        debug!(
            "Listed {} {} snapshots of {} in {}",
            snapshots.len(),
            kind,
            owner_identifier,
            self.region
        );

        Ok(snapshots)
    }

    async fn list_tags(&self, resource_arn: &str) -> Result<Vec<SnapshotTag>, SnapshotApiError> {
        let output = self
            .client
            .list_tags_for_resource()
            .resource_name(resource_arn)
            .send()
            .await
            .map_err(service_error)?;

        Ok(output
            .tag_list()
            .iter()
            .map(|tag| {
                SnapshotTag::new(
                    tag.key().unwrap_or_default(),
                    tag.value().unwrap_or_default(),
                )
            })
            .collect())
    }
}
