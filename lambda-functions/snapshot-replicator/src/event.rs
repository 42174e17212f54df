use serde::{Deserialize, Serialize};
use std::fmt;

pub const INSTANCE_SNAPSHOT_DETAIL_TYPE: &str = "RDS DB Snapshot Event";
pub const CLUSTER_SNAPSHOT_DETAIL_TYPE: &str = "RDS DB Cluster Snapshot Event";

/// RDS snapshot notification as delivered by EventBridge.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SnapshotEvent {
    pub region: String,

    #[serde(rename = "detail-type")]
    pub detail_type: DetailType,

    pub detail: EventDetail,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct EventDetail {
    #[serde(default)]
    pub event_categories: Vec<String>,
    pub source_arn: String,
    pub source_identifier: String,
    pub message: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailType {
    #[serde(rename = "RDS DB Snapshot Event")]
    InstanceSnapshot,
    #[serde(rename = "RDS DB Cluster Snapshot Event")]
    ClusterSnapshot,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCategory {
    Creation,
    Backup,
    Deletion,
    Unknown,
}

impl EventCategory {
    pub fn parse(value: &str) -> Self {
        match value {
            "creation" => Self::Creation,
            "backup" => Self::Backup,
            "deletion" => Self::Deletion,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Creation => write!(f, "creation"),
            Self::Backup => write!(f, "backup"),
            Self::Deletion => write!(f, "deletion"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl SnapshotEvent {
    /// First entry of `EventCategories`, as routed on.
    pub fn category_label(&self) -> &str {
        self.detail
            .event_categories
            .first()
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn category(&self) -> EventCategory {
        EventCategory::parse(self.category_label())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Response {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl Response {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            body: body.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn creation_event() -> serde_json::Value {
        json!({
            "version": "0",
            "id": "844e2571-85d4-695f-b930-0153b71dcb42",
            "detail-type": "RDS DB Snapshot Event",
            "source": "aws.rds",
            "account": "123456789012",
            "time": "2025-01-06T03:12:45Z",
            "region": "us-east-1",
            "resources": ["arn:aws:rds:us-east-1:123456789012:snapshot:rds:orders-db-2025-01-06-03-10"],
            "detail": {
                "EventCategories": ["creation"],
                "SourceType": "SNAPSHOT",
                "SourceArn": "arn:aws:rds:us-east-1:123456789012:snapshot:rds:orders-db-2025-01-06-03-10",
                "Date": "2025-01-06T03:12:45.123Z",
                "Message": "Automated snapshot created",
                "SourceIdentifier": "rds:orders-db-2025-01-06-03-10",
                "EventID": "RDS-EVENT-0091"
            }
        })
    }

    #[test]
    fn test_event_deserialization() {
        let event: SnapshotEvent = serde_json::from_value(creation_event()).unwrap();
        assert_eq!(event.region, "us-east-1");
        assert_eq!(event.detail_type, DetailType::InstanceSnapshot);
        assert_eq!(event.category(), EventCategory::Creation);
        assert_eq!(event.detail.message, "Automated snapshot created");
        assert_eq!(event.detail.source_identifier, "rds:orders-db-2025-01-06-03-10");
    }

    #[test]
    fn test_unknown_detail_type_and_category() {
        let mut raw = creation_event();
        raw["detail-type"] = json!("RDS DB Instance Event");
        raw["detail"]["EventCategories"] = json!([]);

        let event: SnapshotEvent = serde_json::from_value(raw).unwrap();
        assert_eq!(event.detail_type, DetailType::Unknown);
        assert_eq!(event.category_label(), "");
        assert_eq!(event.category(), EventCategory::Unknown);
    }

    #[test]
    fn test_cluster_detail_type() {
        let mut raw = creation_event();
        raw["detail-type"] = json!(CLUSTER_SNAPSHOT_DETAIL_TYPE);
        raw["detail"]["EventCategories"] = json!(["backup", "notification"]);

        let event: SnapshotEvent = serde_json::from_value(raw).unwrap();
        assert_eq!(event.detail_type, DetailType::ClusterSnapshot);
        assert_eq!(event.category(), EventCategory::Backup);
    }

    #[test]
    fn test_response_serialization() {
        let response = Response::ok("copied");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["body"], "copied");
    }
}
