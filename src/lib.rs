// src/lib.rs

pub mod archive;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod export;
pub mod logging;
pub mod pipeline;
pub mod publish;
pub mod restore;
pub mod types;

use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::ConfigFile;
use crate::config::loader::{load_and_validate, resolve_password};
use crate::errors::BackupError;
use crate::exec::RealProcessRunner;
use crate::logging::LogBuffer;
use crate::pipeline::{Pipeline, RestoreSettings, RunReport, UploadSettings};
use crate::publish::{NotifyTarget, S3Store, SnsNotifier};
use crate::restore::{ConnParams, PostgresProvisioner};
use crate::types::{RunContext, TimestampToken};

/// Printed in front of any fatal configuration error.
pub const CONFIG_HELP: &str = "
    -----------------------------------------
        Before executing this tool you need a
        cartodbbkconfig.toml file properly
        formed (see cartodbbkconfig.example.toml).
    -----------------------------------------";

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (the only fatal failure point)
/// - the run context and its timestamp token
/// - the production backends (processes, PostgreSQL, S3, SNS)
/// - the pipeline run and its summary
///
/// Returns the report of the run; with `--strict` a run with failed stages
/// becomes an error.
pub async fn run(args: CliArgs) -> Result<Option<RunReport>> {
    let flags = args.flags();
    let cfg = load_and_validate(&args.config, &flags).context(CONFIG_HELP)?;

    let ctx = RunContext::new(&cfg, flags, TimestampToken::now());

    if args.dry_run {
        print_dry_run(&ctx, &cfg);
        return Ok(None);
    }

    std::fs::create_dir_all(ctx.output_dir())
        .map_err(|e| {
            BackupError::Config(format!(
                "cannot create sql_folder {}: {e}",
                ctx.output_dir().display()
            ))
        })
        .context(CONFIG_HELP)?;

    let pipeline = build_pipeline(&cfg, ctx).await.context(CONFIG_HELP)?;
    debug!(?pipeline, "pipeline assembled");

    let mut log = LogBuffer::new();
    let report = pipeline.run(&mut log).await;
    report.log_summary();

    if args.strict && report.has_failures() {
        bail!(
            "backup run {} finished with failed stages: {:?}",
            report.token,
            report.failed_stages()
        );
    }

    Ok(Some(report))
}

/// Assemble the pipeline with production backends for the requested stages.
///
/// The PostgreSQL password prompt happens here, before any stage runs.
pub async fn build_pipeline(cfg: &ConfigFile, ctx: RunContext) -> crate::errors::Result<Pipeline> {
    let flags = ctx.flags;
    let timeout = cfg.runner.timeout_secs.map(Duration::from_secs);
    let mut pipeline = Pipeline::new(ctx, RealProcessRunner::new(timeout));

    if flags.restore {
        if let Some(pg) = &cfg.postgis {
            let password = resolve_password(pg)?;
            pipeline = pipeline.with_restore(
                PostgresProvisioner,
                RestoreSettings {
                    conn: ConnParams::from_section(pg, Some(password)),
                    base_name: pg.new_database.clone(),
                    drop_existing: pg.drop_existing,
                },
            );
        }
    }

    if flags.upload {
        if let Some(aws) = &cfg.aws {
            pipeline = pipeline.with_upload(
                S3Store::from_section(aws).await,
                UploadSettings {
                    bucket: aws.bucket.clone(),
                    prefix: aws.prefix.clone(),
                },
            );

            if flags.notify_effective() {
                pipeline = pipeline.with_notify(
                    SnsNotifier::from_sections(aws, cfg.sns.as_ref()).await,
                    NotifyTarget::from_config(Some(aws), cfg.sns.as_ref()),
                );
            }
        }
    }

    Ok(pipeline)
}

/// Print what a run would do without doing it.
fn print_dry_run(ctx: &RunContext, cfg: &ConfigFile) {
    println!("cartodb_backup dry-run");
    println!("  domain: {}", ctx.domain_ref());
    println!("  dump file: {}", ctx.dump_path().display());
    println!("  archive: {}", ctx.archive_path().display());
    println!();

    println!("stages:");
    println!("  - export (ogr2ogr)");
    match (ctx.flags.restore, &cfg.postgis) {
        (true, Some(pg)) => {
            println!(
                "  - restore into {} on {}:{} as {}{}",
                ctx.target_database(&pg.new_database),
                pg.host,
                pg.port,
                pg.user,
                if pg.drop_existing { " (drop existing)" } else { "" }
            );
        }
        _ => println!("  - restore: skipped"),
    }
    println!("  - compress + remove sql file");
    match (ctx.flags.upload, &cfg.aws) {
        (true, Some(aws)) => {
            println!(
                "  - upload to s3://{}/{}",
                aws.bucket,
                publish::object_key(&aws.prefix, &ctx.archive_path())
            );
            if ctx.flags.remove_local_after_upload {
                println!("  - remove local archive after upload");
            }
        }
        _ => println!("  - upload: skipped"),
    }
    if ctx.flags.notify_effective() {
        let target = NotifyTarget::from_config(cfg.aws.as_ref(), cfg.sns.as_ref());
        println!(
            "  - notify {} with subject {:?}",
            target.topic_arn.as_deref().unwrap_or("<missing topic_arn>"),
            target.subject_line()
        );
    } else {
        println!("  - notify: skipped");
    }

    info!("dry-run complete (no execution)");
}
