// src/publish/mod.rs

//! Offsite archival and run notification.
//!
//! - [`s3`] defines the `ObjectStore` seam and the Amazon S3 implementation.
//! - [`sns`] defines the `Notifier` seam and the Amazon SNS implementation.
//!
//! The functions here hold the policy: how object keys are built, when the
//! local archive may be deleted and when a notification is skipped.

pub mod s3;
pub mod sns;

use std::path::Path;

pub use s3::{ObjectStore, S3Store};
pub use sns::{Notifier, SnsNotifier};

use crate::archive;
use crate::config::{AwsSection, SnsSection};
use crate::logging::LogBuffer;
use crate::pipeline::StageOutcome;

const SUBJECT_SUFFIX: &str = "Finished AWS S3 backup!";

/// `prefix` followed by the archive's file name, with no separator added.
pub fn object_key(prefix: &str, archive: &Path) -> String {
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{prefix}{name}")
}

/// Outcome of the upload stage and of the optional local cleanup after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub upload: StageOutcome,
    /// `None` when removal was not requested or the upload failed.
    pub removal: Option<StageOutcome>,
}

/// Upload `archive` under `<prefix><file name>`.
///
/// The local file is removed only after a successful upload and only when
/// `remove_local` is set.
pub async fn upload(
    store: &dyn ObjectStore,
    archive_path: &Path,
    bucket: &str,
    prefix: &str,
    remove_local: bool,
    log: &mut LogBuffer,
) -> UploadReport {
    let key = object_key(prefix, archive_path);

    let body = match tokio::fs::read(archive_path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let msg = format!("AWS S3 error: reading {}: {e}", archive_path.display());
            log.error(msg.clone());
            return UploadReport {
                upload: StageOutcome::Failed(msg),
                removal: None,
            };
        }
    };

    if let Err(err) = store.put_object(bucket, &key, body).await {
        log.error(err.to_string());
        return UploadReport {
            upload: StageOutcome::Failed(err.to_string()),
            removal: None,
        };
    }
    log.info(format!("File successfully uploaded to Amazon S3: s3://{bucket}/{key}"));

    let removal = remove_local.then(|| match archive::remove(archive_path) {
        Ok(()) => {
            log.info(format!(
                "Local file successfully removed: {}",
                archive_path.display()
            ));
            StageOutcome::Succeeded
        }
        Err(err) => {
            log.error(format!("Error removing local file: {err}"));
            StageOutcome::Failed(err.to_string())
        }
    });

    UploadReport {
        upload: StageOutcome::Succeeded,
        removal,
    }
}

/// Who to notify and under which subject.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyTarget {
    /// AWS account identifier (the configured access key).
    pub account: Option<String>,
    pub topic_arn: Option<String>,
    pub subject: Option<String>,
}

impl NotifyTarget {
    pub fn from_config(aws: Option<&AwsSection>, sns: Option<&SnsSection>) -> Self {
        Self {
            account: aws.and_then(|a| a.access_key.clone()),
            topic_arn: sns.and_then(|s| s.topic_arn.clone()),
            subject: sns.and_then(|s| s.subject.clone()),
        }
    }

    /// `"<subject> - Finished AWS S3 backup!"`, or just the suffix.
    pub fn subject_line(&self) -> String {
        match self.subject.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(subject) => format!("{subject} - {SUBJECT_SUFFIX}"),
            None => SUBJECT_SUFFIX.to_string(),
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Publish every buffered record, one per line.
///
/// Without an account identifier and a topic this logs an error and returns
/// [`StageOutcome::Skipped`]; it is never retried.
pub async fn notify(
    notifier: &dyn Notifier,
    target: &NotifyTarget,
    log: &mut LogBuffer,
) -> StageOutcome {
    let (Some(_account), Some(topic_arn)) = (present(&target.account), present(&target.topic_arn))
    else {
        let reason = "missing AWS access key or SNS topic ARN";
        log.error(format!(
            "Message not sent with AWS Simple Notification Service: {reason}"
        ));
        return StageOutcome::Skipped(reason.to_string());
    };

    let subject = target.subject_line();
    let body = log.render();

    match notifier.publish(topic_arn, &subject, &body).await {
        Ok(()) => {
            log.info("Message successfully sent with AWS SNS...");
            StageOutcome::Succeeded
        }
        Err(err) => {
            log.error(err.to_string());
            StageOutcome::Failed(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn key_is_prefix_plus_basename() {
        let archive = PathBuf::from("/tmp/bk/cartodb_backup_20240101_000000.zip");
        assert_eq!(
            object_key("backups/cartodb/", &archive),
            "backups/cartodb/cartodb_backup_20240101_000000.zip"
        );
        assert_eq!(object_key("", &archive), "cartodb_backup_20240101_000000.zip");
    }

    #[test]
    fn subject_line_appends_suffix() {
        let mut target = NotifyTarget::default();
        assert_eq!(target.subject_line(), "Finished AWS S3 backup!");

        target.subject = Some("Acme".into());
        assert_eq!(target.subject_line(), "Acme - Finished AWS S3 backup!");
    }

    #[test]
    fn target_reads_account_from_aws_section() {
        let aws = AwsSection {
            access_key: Some("AKIA".into()),
            secret_key: Some("secret".into()),
            bucket: "b".into(),
            prefix: String::new(),
            region: "us-east-1".into(),
        };
        let sns = SnsSection {
            region: None,
            topic_arn: Some("arn:aws:sns:us-east-1:1:t".into()),
            subject: None,
        };

        let target = NotifyTarget::from_config(Some(&aws), Some(&sns));
        assert_eq!(target.account.as_deref(), Some("AKIA"));
        assert_eq!(target.topic_arn.as_deref(), Some("arn:aws:sns:us-east-1:1:t"));

        let target = NotifyTarget::from_config(Some(&aws), None);
        assert!(target.topic_arn.is_none());
    }
}
