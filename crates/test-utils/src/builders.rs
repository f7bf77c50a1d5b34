use std::path::Path;

use cartodb_backup::config::{
    AwsSection, CartodbSection, ConfigFile, PostgisSection, RawConfigFile, RunnerSection,
    SnsSection,
};
use cartodb_backup::pipeline::{RestoreSettings, UploadSettings};
use cartodb_backup::restore::ConnParams;
use cartodb_backup::types::{RunContext, RunFlags, TimestampToken};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new(sql_folder: impl AsRef<Path>) -> Self {
        Self {
            config: RawConfigFile {
                cartodb: CartodbSection {
                    api_key: "test-api-key".to_string(),
                    domain: "acme".to_string(),
                    sql_folder: sql_folder.as_ref().to_path_buf(),
                },
                postgis: None,
                aws: None,
                sns: None,
                runner: RunnerSection::default(),
            },
        }
    }

    pub fn domain(mut self, domain: &str) -> Self {
        self.config.cartodb.domain = domain.to_string();
        self
    }

    pub fn with_postgis(mut self, new_database: &str) -> Self {
        self.config.postgis = Some(PostgisSection {
            database: "postgres".to_string(),
            user: "admin".to_string(),
            password: Some("secret".to_string()),
            host: "localhost".to_string(),
            port: 5432,
            new_database: new_database.to_string(),
            drop_existing: false,
        });
        self
    }

    /// Requires `with_postgis` first.
    pub fn drop_existing(mut self, drop: bool) -> Self {
        if let Some(pg) = self.config.postgis.as_mut() {
            pg.drop_existing = drop;
        }
        self
    }

    pub fn with_aws(mut self, bucket: &str, prefix: &str) -> Self {
        self.config.aws = Some(AwsSection {
            access_key: Some("AKIATEST".to_string()),
            secret_key: Some("secret".to_string()),
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
            region: "us-east-1".to_string(),
        });
        self
    }

    pub fn with_sns(mut self, topic_arn: Option<&str>, subject: Option<&str>) -> Self {
        self.config.sns = Some(SnsSection {
            region: None,
            topic_arn: topic_arn.map(str::to_string),
            subject: subject.map(str::to_string),
        });
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

/// Shorthand for a run context with a fixed token.
pub fn context(cfg: &ConfigFile, flags: RunFlags, token: &str) -> RunContext {
    let token: TimestampToken = token
        .parse()
        .expect("token must look like YYYYMMDD_HHMMSS");
    RunContext::new(cfg, flags, token)
}

/// Restore settings matching `ConfigFileBuilder::with_postgis`.
pub fn restore_settings(cfg: &ConfigFile) -> RestoreSettings {
    let pg = cfg.postgis.as_ref().expect("config has no [postgis] section");
    RestoreSettings {
        conn: ConnParams::from_section(pg, None),
        base_name: pg.new_database.clone(),
        drop_existing: pg.drop_existing,
    }
}

/// Upload settings matching `ConfigFileBuilder::with_aws`.
pub fn upload_settings(cfg: &ConfigFile) -> UploadSettings {
    let aws = cfg.aws.as_ref().expect("config has no [aws] section");
    UploadSettings {
        bucket: aws.bucket.clone(),
        prefix: aws.prefix.clone(),
    }
}
