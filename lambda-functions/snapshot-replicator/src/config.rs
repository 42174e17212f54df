use bon::Builder;

use crate::error::ConfigError;

pub const AUTOMATED_DELETE_MANUAL_SNAPSHOT: &str = "automated_delete_manual_snapshot";
pub const AUTOMATED_SNAPSHOT_MAXIMUM_COPIES: &str = "automated_snapshot_maximum_copies";
pub const DEST_REGION: &str = "dest_region";
pub const RDS_INSTANCES: &str = "rds_instances";
pub const RDS_CLUSTERS: &str = "rds_clusters";
pub const KMS_KEY_ID: &str = "kms_key_id";
pub const ENCRYPT_RDS_INSTANCE_SNAPSHOT: &str = "encrypt_rds_instance_snapshot";
pub const SNS_TOPIC_ARN: &str = "sns_topic_arn";

/// Process-wide settings, read once at cold start.
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(on(String, into))]
pub struct ReplicatorConfig {
    /// Delete the destination copy when a manual source snapshot is deleted.
    #[builder(default = false)]
    pub delete_manual_snapshots: bool,

    /// Automated copies kept per resource. Zero disables pruning.
    #[builder(default = 0)]
    pub maximum_copies: usize,

    pub dest_region: String,

    #[builder(default)]
    pub rds_instances: Vec<String>,

    #[builder(default)]
    pub rds_clusters: Vec<String>,

    pub kms_key_id: String,

    /// Force a KMS key on copies of unencrypted instance snapshots.
    #[builder(default = false)]
    pub encrypt_instance_snapshots: bool,

    pub sns_topic_arn: String,
}

impl ReplicatorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

        let maximum_copies_raw = require(AUTOMATED_SNAPSHOT_MAXIMUM_COPIES)?;
        let maximum_copies =
            maximum_copies_raw
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::Invalid {
                    name: AUTOMATED_SNAPSHOT_MAXIMUM_COPIES,
                    value: maximum_copies_raw.clone(),
                    expected: "a non-negative integer",
                })?;

        Ok(Self {
            delete_manual_snapshots: parse_flag(
                AUTOMATED_DELETE_MANUAL_SNAPSHOT,
                &require(AUTOMATED_DELETE_MANUAL_SNAPSHOT)?,
            )?,
            maximum_copies,
            dest_region: require(DEST_REGION)?.trim().to_string(),
            rds_instances: parse_list(&require(RDS_INSTANCES)?),
            rds_clusters: parse_list(&require(RDS_CLUSTERS)?),
            kms_key_id: require(KMS_KEY_ID)?.trim().to_string(),
            encrypt_instance_snapshots: parse_flag(
                ENCRYPT_RDS_INSTANCE_SNAPSHOT,
                &require(ENCRYPT_RDS_INSTANCE_SNAPSHOT)?,
            )?,
            sns_topic_arn: require(SNS_TOPIC_ARN)?.trim().to_string(),
        })
    }

    pub fn is_instance_allowed(&self, instance_identifier: &str) -> bool {
        self.rds_instances.iter().any(|name| name == instance_identifier)
    }

    pub fn is_cluster_allowed(&self, cluster_identifier: &str) -> bool {
        self.rds_clusters.iter().any(|name| name == cluster_identifier)
    }
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" => Ok(true),
        "no" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
            expected: "yes or no",
        }),
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            (AUTOMATED_DELETE_MANUAL_SNAPSHOT, "no"),
            (AUTOMATED_SNAPSHOT_MAXIMUM_COPIES, "3"),
            (DEST_REGION, "us-west-2"),
            (RDS_INSTANCES, "orders-db, billing-db"),
            (RDS_CLUSTERS, "aurora-main"),
            (KMS_KEY_ID, "arn:aws:kms:us-west-2:123456789012:key/abcd"),
            (ENCRYPT_RDS_INSTANCE_SNAPSHOT, "Yes"),
            (SNS_TOPIC_ARN, "arn:aws:sns:us-east-1:123456789012:snapshot-alerts"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<ReplicatorConfig, ConfigError> {
        ReplicatorConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
    }

    #[test]
    fn test_from_lookup() {
        let config = load(&env()).unwrap();
        assert!(!config.delete_manual_snapshots);
        assert_eq!(config.maximum_copies, 3);
        assert_eq!(config.dest_region, "us-west-2");
        assert_eq!(config.rds_instances, vec!["orders-db", "billing-db"]);
        assert_eq!(config.rds_clusters, vec!["aurora-main"]);
        assert!(config.encrypt_instance_snapshots);
    }

    #[test]
    fn test_missing_variable_fails_fast() {
        let mut vars = env();
        vars.remove(KMS_KEY_ID);
        assert_eq!(load(&vars), Err(ConfigError::Missing(KMS_KEY_ID)));
    }

    #[test]
    fn test_invalid_flag_and_count() {
        let mut vars = env();
        vars.insert(AUTOMATED_DELETE_MANUAL_SNAPSHOT, "sometimes");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { name: AUTOMATED_DELETE_MANUAL_SNAPSHOT, .. })
        ));

        let mut vars = env();
        vars.insert(AUTOMATED_SNAPSHOT_MAXIMUM_COPIES, "-1");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { name: AUTOMATED_SNAPSHOT_MAXIMUM_COPIES, .. })
        ));
    }

    #[test]
    fn test_empty_allow_list_matches_nothing() {
        let mut vars = env();
        vars.insert(RDS_INSTANCES, "");
        let config = load(&vars).unwrap();
        assert!(config.rds_instances.is_empty());
        assert!(!config.is_instance_allowed(""));
    }

    #[test]
    fn test_allow_list_lookup() {
        let config = ReplicatorConfig::builder()
            .dest_region("us-west-2")
            .kms_key_id("key")
            .sns_topic_arn("topic")
            .rds_instances(vec!["orders-db".to_string()])
            .rds_clusters(vec!["aurora-main".to_string()])
            .build();

        assert!(config.is_instance_allowed("orders-db"));
        assert!(!config.is_instance_allowed("orders"));
        assert!(config.is_cluster_allowed("aurora-main"));
        assert!(!config.is_cluster_allowed("orders-db"));
        assert_eq!(config.maximum_copies, 0);
    }
}
