// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

/// File name looked up inside the folder given on the command line.
pub const CONFIG_FILE_NAME: &str = "cartodbbkconfig.toml";

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [cartodb]
/// api_key = "0123abcd"
/// domain = "acme"
/// sql_folder = "/var/backups/cartodb"
///
/// [postgis]
/// database = "postgres"
/// user = "postgres"
/// host = "localhost"
/// port = 5432
/// new_database = "acme_mirror"
///
/// [aws]
/// access_key = "AKIA..."
/// secret_key = "..."
/// bucket = "backups"
/// prefix = "cartodb/"
///
/// [sns]
/// region = "eu-west-1"
/// topic_arn = "arn:aws:sns:eu-west-1:123456789012:backups"
/// subject = "Acme"
/// ```
///
/// Only `[cartodb]` is always required; the other sections are checked
/// against the requested stages by [`ConfigFile::validate_for`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    pub cartodb: CartodbSection,

    #[serde(default)]
    pub postgis: Option<PostgisSection>,

    #[serde(default)]
    pub aws: Option<AwsSection>,

    #[serde(default)]
    pub sns: Option<SnsSection>,

    #[serde(default)]
    pub runner: RunnerSection,
}

/// Validated configuration. Build it through `ConfigFile::try_from`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub cartodb: CartodbSection,
    pub postgis: Option<PostgisSection>,
    pub aws: Option<AwsSection>,
    pub sns: Option<SnsSection>,
    pub runner: RunnerSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            cartodb: raw.cartodb,
            postgis: raw.postgis,
            aws: raw.aws,
            sns: raw.sns,
            runner: raw.runner,
        }
    }
}

/// `[cartodb]` section: what to export and where to put it.
#[derive(Debug, Clone, Deserialize)]
pub struct CartodbSection {
    pub api_key: String,
    pub domain: String,
    pub sql_folder: PathBuf,
}

/// `[postgis]` section: admin connection used to create the restore target.
#[derive(Debug, Clone, Deserialize)]
pub struct PostgisSection {
    /// Bootstrap database the admin connection opens (not the target).
    pub database: String,

    pub user: String,

    /// When absent the operator is prompted on the terminal.
    #[serde(default)]
    pub password: Option<String>,

    #[serde(default = "default_pg_host")]
    pub host: String,

    #[serde(default = "default_pg_port")]
    pub port: u16,

    /// Base name; the run token is appended to it.
    pub new_database: String,

    /// Drop a same-named database before creating it. Off unless set.
    #[serde(default = "default_drop_existing")]
    pub drop_existing: bool,
}

fn default_pg_host() -> String {
    "localhost".to_string()
}

fn default_pg_port() -> u16 {
    5432
}

fn default_drop_existing() -> bool {
    false
}

/// `[aws]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct AwsSection {
    /// Static credentials. If either key is missing the default AWS
    /// credential chain (environment, profile, instance role) is used.
    #[serde(default)]
    pub access_key: Option<String>,

    #[serde(default)]
    pub secret_key: Option<String>,

    pub bucket: String,

    /// Prepended verbatim to the archive file name to form the object key.
    #[serde(default)]
    pub prefix: String,

    #[serde(default = "default_aws_region")]
    pub region: String,
}

fn default_aws_region() -> String {
    "us-east-1".to_string()
}

impl AwsSection {
    pub fn static_credentials(&self) -> Option<(&str, &str)> {
        match (self.access_key.as_deref(), self.secret_key.as_deref()) {
            (Some(ak), Some(sk)) if !ak.is_empty() && !sk.is_empty() => Some((ak, sk)),
            _ => None,
        }
    }
}

/// `[sns]` section. Every field is optional: a missing topic turns the
/// notification into a logged no-op instead of a configuration error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnsSection {
    #[serde(default)]
    pub region: Option<String>,

    #[serde(default)]
    pub topic_arn: Option<String>,

    #[serde(default)]
    pub subject: Option<String>,
}

/// `[runner]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunnerSection {
    /// Upper bound for each external command. Unbounded when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}
