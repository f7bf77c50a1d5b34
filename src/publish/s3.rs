// src/publish/s3.rs

use std::future::Future;
use std::pin::Pin;

use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use tracing::debug;

use crate::config::AwsSection;
use crate::errors::{BackupError, Result};

/// Where archives go.
pub trait ObjectStore: Send + Sync {
    /// Store `body` under `bucket`/`key`, replacing any existing object.
    fn put_object<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
        body: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Amazon S3 through the official SDK.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: aws_sdk_s3::Client,
}

impl S3Store {
    /// Static keys from `[aws]` win; without them the default credential
    /// chain is used.
    pub async fn from_section(section: &AwsSection) -> Self {
        let shared = load_sdk_config(section, &section.region).await;
        Self {
            client: aws_sdk_s3::Client::new(&shared),
        }
    }
}

pub(crate) async fn load_sdk_config(section: &AwsSection, region: &str) -> aws_config::SdkConfig {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));

    if let Some((access_key, secret_key)) = section.static_credentials() {
        loader = loader.credentials_provider(Credentials::new(
            access_key,
            secret_key,
            None,
            None,
            "cartodb-backup-config",
        ));
    }

    loader.load().await
}

impl ObjectStore for S3Store {
    fn put_object<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
        body: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            debug!(bucket, key, bytes = body.len(), "putting object");
            self.client
                .put_object()
                .bucket(bucket)
                .key(key)
                .body(ByteStream::from(body))
                .send()
                .await
                .map_err(|e| BackupError::Upload(DisplayErrorContext(&e).to_string()))?;
            Ok(())
        })
    }
}
