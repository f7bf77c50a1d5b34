// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{BackupError, Result};
use crate::types::RunFlags;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::BackupError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

impl ConfigFile {
    /// Check that every section needed by the requested stages is present.
    ///
    /// Runs before any stage so a missing `[postgis]` or `[aws]` section
    /// aborts the whole invocation instead of failing half-way.
    pub fn validate_for(&self, flags: &RunFlags) -> Result<()> {
        if flags.restore && self.postgis.is_none() {
            return Err(BackupError::Config(
                "--postgis_backup requires a [postgis] section".to_string(),
            ));
        }

        if flags.upload && self.aws.is_none() {
            return Err(BackupError::Config(
                "--aws_s3upload requires an [aws] section".to_string(),
            ));
        }

        Ok(())
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_cartodb(cfg)?;
    validate_postgis(cfg)?;
    validate_aws(cfg)?;
    Ok(())
}

fn require_non_empty(section: &str, key: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BackupError::Config(format!(
            "[{section}].{key} must not be empty"
        )));
    }
    Ok(())
}

fn validate_cartodb(cfg: &RawConfigFile) -> Result<()> {
    let c = &cfg.cartodb;
    require_non_empty("cartodb", "api_key", &c.api_key)?;
    require_non_empty("cartodb", "domain", &c.domain)?;
    if c.sql_folder.as_os_str().is_empty() {
        return Err(BackupError::Config(
            "[cartodb].sql_folder must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_postgis(cfg: &RawConfigFile) -> Result<()> {
    let Some(pg) = &cfg.postgis else {
        return Ok(());
    };

    require_non_empty("postgis", "database", &pg.database)?;
    require_non_empty("postgis", "user", &pg.user)?;
    require_non_empty("postgis", "host", &pg.host)?;
    require_non_empty("postgis", "new_database", &pg.new_database)?;

    if pg.port == 0 {
        return Err(BackupError::Config(
            "[postgis].port must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_aws(cfg: &RawConfigFile) -> Result<()> {
    let Some(aws) = &cfg.aws else {
        return Ok(());
    };

    require_non_empty("aws", "bucket", &aws.bucket)?;
    require_non_empty("aws", "region", &aws.region)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_text: &str) -> RawConfigFile {
        toml::from_str(toml_text).unwrap()
    }

    const BASE: &str = r#"
[cartodb]
api_key = "k"
domain = "acme"
sql_folder = "/tmp/bk"
"#;

    #[test]
    fn minimal_config_is_valid_without_optional_stages() {
        let cfg = ConfigFile::try_from(parse(BASE)).unwrap();
        assert!(cfg.validate_for(&RunFlags::default()).is_ok());
    }

    #[test]
    fn empty_domain_is_rejected() {
        let raw = parse(
            r#"
[cartodb]
api_key = "k"
domain = "  "
sql_folder = "/tmp/bk"
"#,
        );
        match ConfigFile::try_from(raw) {
            Err(BackupError::Config(msg)) => assert!(msg.contains("domain")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn restore_without_postgis_section_is_fatal() {
        let cfg = ConfigFile::try_from(parse(BASE)).unwrap();
        let flags = RunFlags {
            restore: true,
            ..RunFlags::default()
        };
        let err = cfg.validate_for(&flags).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("[postgis]"));
    }

    #[test]
    fn upload_without_aws_section_is_fatal() {
        let cfg = ConfigFile::try_from(parse(BASE)).unwrap();
        let flags = RunFlags {
            upload: true,
            ..RunFlags::default()
        };
        assert!(cfg.validate_for(&flags).is_err());
    }

    #[test]
    fn postgis_defaults_apply() {
        let text = format!(
            "{BASE}\n[postgis]\ndatabase = \"postgres\"\nuser = \"admin\"\nnew_database = \"mirror\"\n"
        );
        let cfg = ConfigFile::try_from(parse(&text)).unwrap();
        let pg = cfg.postgis.unwrap();
        assert_eq!(pg.host, "localhost");
        assert_eq!(pg.port, 5432);
        assert!(!pg.drop_existing);
        assert!(pg.password.is_none());
    }
}
