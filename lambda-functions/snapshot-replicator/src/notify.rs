use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sns::error::DisplayErrorContext;
use aws_sdk_sns::Client as SnsClient;
use tracing::{error, info};

pub const NOTIFICATION_SUBJECT: &str = "Auto Copy RDS Snapshot To X Region Notification";

/// Operator alerting. Delivery is best effort and never fails the caller.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str);
}

pub struct SnsNotifier {
    client: SnsClient,
    topic_arn: String,
}

impl SnsNotifier {
    pub fn new(shared: &SdkConfig, topic_arn: impl Into<String>) -> Self {
        Self {
            client: SnsClient::new(shared),
            topic_arn: topic_arn.into(),
        }
    }
}

#[async_trait]
impl Notifier for SnsNotifier {
    async fn notify(&self, message: &str) {
        let result = self
            .client
            .publish()
            .topic_arn(&self.topic_arn)
            .message(message)
            .subject(NOTIFICATION_SUBJECT)
            .send()
            .await;

        match result {
            Ok(_) => info!("Published notification to {}", self.topic_arn),
            Err(e) => error!(
                "Failed to publish notification to {}: {}",
                self.topic_arn,
                DisplayErrorContext(&e)
            ),
        }
    }
}
