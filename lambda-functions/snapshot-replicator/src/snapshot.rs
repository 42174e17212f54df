use chrono::{DateTime, Utc};
use std::fmt;

pub const SOURCE_SNAPSHOT_TAG: &str = "Source-Snapshot";
pub const SOURCE_SNAPSHOT_TYPE_TAG: &str = "Source-Snapshot-Type";
pub const TARGET_SUFFIX: &str = "-autocopied";

/// Which RDS snapshot namespace an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKind {
    Instance,
    Cluster,
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance => write!(f, "instance"),
            Self::Cluster => write!(f, "cluster"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotType {
    Automated,
    Manual,
    Other,
}

impl SnapshotType {
    /// Value written to the `Source-Snapshot-Type` tag.
    pub fn as_tag_value(&self) -> &'static str {
        match self {
            Self::Automated => "Automated",
            Self::Manual => "Manual",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for SnapshotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag_value())
    }
}

/// Source snapshot as seen from one notification event.
///
/// `owner_identifier` and `is_encrypted` are only populated for "created"
/// messages. An empty owner means the lookup failed or was never attempted.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSnapshotInfo {
    pub kind: SnapshotKind,
    pub source_snapshot_arn: String,
    pub source_snapshot_identifier: String,
    pub owner_identifier: String,
    pub message: String,
    pub event_category: String,
    pub snapshot_type: SnapshotType,
    pub is_encrypted: Option<bool>,
}

impl SourceSnapshotInfo {
    pub fn target_snapshot_identifier(&self) -> String {
        target_snapshot_identifier(&self.source_snapshot_identifier)
    }

    pub fn copy_tags(&self) -> Vec<SnapshotTag> {
        vec![
            SnapshotTag::new(SOURCE_SNAPSHOT_TAG, &self.source_snapshot_arn),
            SnapshotTag::new(SOURCE_SNAPSHOT_TYPE_TAG, self.snapshot_type.as_tag_value()),
        ]
    }
}

/// Name of the destination copy for a source snapshot identifier.
///
/// Automated identifiers look like `rds:db-2024-01-01-00-00`; colons are not
/// valid in a user-supplied identifier so they become dashes.
pub fn target_snapshot_identifier(source_snapshot_identifier: &str) -> String {
    format!(
        "{}{}",
        source_snapshot_identifier.replace(':', "-"),
        TARGET_SUFFIX
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotTag {
    pub key: String,
    pub value: String,
}

impl SnapshotTag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn marks_automated_copy(&self) -> bool {
        self.key == SOURCE_SNAPSHOT_TYPE_TAG && self.value == SnapshotType::Automated.as_tag_value()
    }
}

/// Owner and encryption state of a source snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotDescription {
    pub owner_identifier: String,
    pub encrypted: bool,
}

/// A snapshot that already exists in the destination region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationSnapshot {
    pub identifier: String,
    pub arn: String,
    /// `None` while the snapshot is still being created.
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopySnapshotRequest {
    pub source_snapshot_arn: String,
    pub target_snapshot_identifier: String,
    pub source_region: String,
    pub tags: Vec<SnapshotTag>,
    pub copy_tags: bool,
    pub kms_key_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionCandidate {
    pub target_snapshot_identifier: String,
    pub created_at: DateTime<Utc>,
}

/// Orders candidates newest first.
pub fn sort_newest_first(candidates: &mut [RetentionCandidate]) {
    candidates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Copies that fall outside the retention window.
///
/// `candidates` must be sorted newest first. The newest `maximum_copies - 1`
/// are kept, leaving room for the copy that triggered pruning. A maximum of
/// zero disables pruning.
pub fn stale_copies(candidates: &[RetentionCandidate], maximum_copies: usize) -> &[RetentionCandidate] {
    if maximum_copies == 0 {
        return &[];
    }
    let keep = maximum_copies - 1;
    candidates.get(keep..).unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn candidate(name: &str, day: u32) -> RetentionCandidate {
        RetentionCandidate {
            target_snapshot_identifier: name.to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 1, day, 3, 0, 0).unwrap(),
        }
    }

    fn names(candidates: &[RetentionCandidate]) -> Vec<&str> {
        candidates
            .iter()
            .map(|c| c.target_snapshot_identifier.as_str())
            .collect()
    }

    #[test]
    fn test_target_identifier_replaces_colons() {
        let id = target_snapshot_identifier("rds:orders-db-2025-01-06-03-10");
        assert_eq!(id, "rds-orders-db-2025-01-06-03-10-autocopied");
        assert!(!id.contains(':'));
    }

    #[test]
    fn test_target_identifier_is_deterministic() {
        let source = "rds:cluster:aurora-1";
        let first = target_snapshot_identifier(source);
        assert_eq!(first, target_snapshot_identifier(source));
        assert_eq!(first, "rds-cluster-aurora-1-autocopied");
    }

    #[test]
    fn test_target_identifier_without_colons() {
        assert_eq!(
            target_snapshot_identifier("nightly-manual"),
            "nightly-manual-autocopied"
        );
    }

    #[test]
    fn test_sort_newest_first() {
        let mut candidates = vec![candidate("c1", 1), candidate("c3", 3), candidate("c2", 2)];
        sort_newest_first(&mut candidates);
        assert_eq!(names(&candidates), vec!["c3", "c2", "c1"]);
    }

    #[test]
    fn test_stale_copies_keeps_newest() {
        let candidates = vec![
            candidate("c5", 5),
            candidate("c4", 4),
            candidate("c3", 3),
            candidate("c2", 2),
            candidate("c1", 1),
        ];
        assert_eq!(names(stale_copies(&candidates, 3)), vec!["c3", "c2", "c1"]);
        assert_eq!(names(stale_copies(&candidates, 1)).len(), 5);
    }

    #[test]
    fn test_stale_copies_disabled_or_under_limit() {
        let candidates = vec![candidate("c2", 2), candidate("c1", 1)];
        assert!(stale_copies(&candidates, 0).is_empty());
        assert!(stale_copies(&candidates, 3).is_empty());
        assert!(stale_copies(&candidates, 4).is_empty());
        assert!(stale_copies(&[], 2).is_empty());
    }

    #[test]
    fn test_copy_tags() {
        let info = SourceSnapshotInfo {
            kind: SnapshotKind::Instance,
            source_snapshot_arn: "arn:aws:rds:us-east-1:123456789012:snapshot:rds:db-1".into(),
            source_snapshot_identifier: "rds:db-1".into(),
            owner_identifier: "db".into(),
            message: "Automated snapshot created".into(),
            event_category: "creation".into(),
            snapshot_type: SnapshotType::Automated,
            is_encrypted: Some(true),
        };

        let tags = info.copy_tags();
        assert_eq!(tags[0].key, "Source-Snapshot");
        assert_eq!(tags[0].value, info.source_snapshot_arn);
        assert!(tags[1].marks_automated_copy());
        assert_eq!(info.target_snapshot_identifier(), "rds-db-1-autocopied");
    }
}
