// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Flag names keep the underscore spelling operators already have in their
//! crontabs (`--postgis_backup`, `--aws_s3upload`, ...).

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::RunFlags;

/// Command-line arguments for `cartodb_backup`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cartodb_backup",
    version,
    about = "Backup an entire CartoDB domain to a zipped SQL dump file.",
    long_about = "Backup an entire CartoDB domain to a zipped SQL dump file. \
                  Optionally restore the dump into a new PostGIS database, \
                  upload the archive to Amazon S3 and report the run via Amazon SNS."
)]
pub struct CliArgs {
    /// Folder containing `cartodbbkconfig.toml`, or the path of a TOML config file.
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Restore the dump into a newly created PostGIS database.
    #[arg(long = "postgis_backup")]
    pub postgis_backup: bool,

    /// Upload the zipped dump to Amazon S3.
    #[arg(long = "aws_s3upload")]
    pub aws_s3upload: bool,

    /// Send the run log through Amazon SNS (only with --aws_s3upload).
    #[arg(long = "amz_sns")]
    pub amz_sns: bool,

    /// Remove the local zip file after a successful Amazon S3 upload.
    #[arg(long = "rmv_localfl")]
    pub rmv_localfl: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CARTODB_BACKUP_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load and validate the config, print the planned run, execute nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Exit with a non-zero status when any stage of the run failed.
    #[arg(long)]
    pub strict: bool,
}

impl CliArgs {
    pub fn flags(&self) -> RunFlags {
        RunFlags {
            restore: self.postgis_backup,
            upload: self.aws_s3upload,
            notify: self.amz_sns,
            remove_local_after_upload: self.rmv_localfl,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
