// src/publish/sns.rs

use std::future::Future;
use std::pin::Pin;

use aws_sdk_sns::error::DisplayErrorContext;
use tracing::debug;

use crate::config::{AwsSection, SnsSection};
use crate::errors::{BackupError, Result};

use super::s3::load_sdk_config;

/// Where run summaries go.
pub trait Notifier: Send + Sync {
    fn publish<'a>(
        &'a self,
        topic_arn: &'a str,
        subject: &'a str,
        message: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Amazon SNS through the official SDK.
#[derive(Debug, Clone)]
pub struct SnsNotifier {
    client: aws_sdk_sns::Client,
}

impl SnsNotifier {
    /// Uses `[sns].region`, falling back to `[aws].region`.
    pub async fn from_sections(aws: &AwsSection, sns: Option<&SnsSection>) -> Self {
        let region = sns
            .and_then(|s| s.region.as_deref())
            .filter(|r| !r.is_empty())
            .unwrap_or(&aws.region);
        let shared = load_sdk_config(aws, region).await;
        Self {
            client: aws_sdk_sns::Client::new(&shared),
        }
    }
}

impl Notifier for SnsNotifier {
    fn publish<'a>(
        &'a self,
        topic_arn: &'a str,
        subject: &'a str,
        message: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            debug!(topic_arn, subject, bytes = message.len(), "publishing notification");
            self.client
                .publish()
                .topic_arn(topic_arn)
                .subject(subject)
                .message(message)
                .send()
                .await
                .map_err(|e| BackupError::Notify(DisplayErrorContext(&e).to_string()))?;
            Ok(())
        })
    }
}
