use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

use crate::config::ConfigFile;

/// Layout of the per-run timestamp token, e.g. `20240309_140507`.
pub const TOKEN_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Prefix shared by the dump and archive file names.
pub const BACKUP_FILE_PREFIX: &str = "cartodb_backup_";

/// Which optional stages the operator asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunFlags {
    /// `--postgis_backup`
    pub restore: bool,
    /// `--aws_s3upload`
    pub upload: bool,
    /// `--amz_sns`
    pub notify: bool,
    /// `--rmv_localfl`
    pub remove_local_after_upload: bool,
}

impl RunFlags {
    /// Notification is only ever sent after an upload attempt.
    pub fn notify_effective(&self) -> bool {
        self.upload && self.notify
    }
}

/// Second-resolution token tying together the artifacts of one run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimestampToken(String);

impl TimestampToken {
    pub fn from_datetime<Tz>(dt: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        Self(dt.format(TOKEN_FORMAT).to_string())
    }

    pub fn now() -> Self {
        Self::from_datetime(&Local::now())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TimestampToken {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        NaiveDateTime::parse_from_str(s, TOKEN_FORMAT)
            .map(|dt| Self(dt.format(TOKEN_FORMAT).to_string()))
            .map_err(|e| format!("invalid timestamp token: {s} ({e}); expected YYYYMMDD_HHMMSS"))
    }
}

impl fmt::Display for TimestampToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable inputs of a single invocation.
#[derive(Clone)]
pub struct RunContext {
    pub api_key: String,
    pub domain: String,
    pub output_dir: PathBuf,
    pub flags: RunFlags,
    pub token: TimestampToken,
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("domain", &self.domain)
            .field("output_dir", &self.output_dir)
            .field("flags", &self.flags)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

impl RunContext {
    pub fn new(cfg: &ConfigFile, flags: RunFlags, token: TimestampToken) -> Self {
        Self {
            api_key: cfg.cartodb.api_key.clone(),
            domain: cfg.cartodb.domain.clone(),
            output_dir: cfg.cartodb.sql_folder.clone(),
            flags,
            token,
        }
    }

    /// Data source name understood by the OGR CartoDB driver.
    pub fn domain_ref(&self) -> String {
        format!("CartoDB:{}", self.domain)
    }

    /// `cartodb_backup_<token>.sql`
    pub fn dump_filename(&self) -> String {
        format!("{BACKUP_FILE_PREFIX}{}.sql", self.token)
    }

    pub fn dump_path(&self) -> PathBuf {
        self.output_dir.join(self.dump_filename())
    }

    /// Where the archiver will place the zip for this run's dump.
    pub fn archive_path(&self) -> PathBuf {
        crate::archive::archive_path_for(&self.output_dir, &self.dump_filename())
    }

    /// `<base>_<token>`
    pub fn target_database(&self, base: &str) -> String {
        format!("{base}_{}", self.token)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn token_uses_compact_date_time() {
        let dt = Utc.with_ymd_and_hms(2015, 11, 2, 8, 30, 0).unwrap();
        assert_eq!(TimestampToken::from_datetime(&dt).as_str(), "20151102_083000");
    }

    #[test]
    fn token_parses_back() {
        let token: TimestampToken = "20240309_140507".parse().unwrap();
        assert_eq!(token.to_string(), "20240309_140507");
        assert!("2024-03-09".parse::<TimestampToken>().is_err());
    }

    #[test]
    fn notify_requires_upload() {
        let flags = RunFlags {
            notify: true,
            ..RunFlags::default()
        };
        assert!(!flags.notify_effective());

        let flags = RunFlags {
            notify: true,
            upload: true,
            ..RunFlags::default()
        };
        assert!(flags.notify_effective());
    }
}
