// src/pipeline/orchestrator.rs

use std::fmt;
use std::path::{Path, PathBuf};

use crate::archive;
use crate::exec::ProcessRunner;
use crate::export;
use crate::logging::LogBuffer;
use crate::publish::{self, NotifyTarget, Notifier, ObjectStore};
use crate::restore::{self, ConnParams, DatabaseProvisioner};
use crate::types::RunContext;

use super::report::{RunReport, Stage, StageOutcome};

/// Connection and naming for the restore stage.
#[derive(Debug, Clone)]
pub struct RestoreSettings {
    pub conn: ConnParams,
    /// The run token is appended to form the target name.
    pub base_name: String,
    pub drop_existing: bool,
}

/// Destination of the upload stage.
#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub bucket: String,
    pub prefix: String,
}

/// One backup run with its backends wired in.
///
/// Optional stages run when their flag is set in the [`RunContext`]. A flag
/// without a matching backend is logged as a failure of that stage; the
/// remaining stages still run.
pub struct Pipeline {
    ctx: RunContext,
    runner: Box<dyn ProcessRunner>,
    restore: Option<(Box<dyn DatabaseProvisioner>, RestoreSettings)>,
    upload: Option<(Box<dyn ObjectStore>, UploadSettings)>,
    notify: Option<(Box<dyn Notifier>, NotifyTarget)>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("ctx", &self.ctx)
            .field("restore", &self.restore.as_ref().map(|(_, s)| s))
            .field("upload", &self.upload.as_ref().map(|(_, s)| s))
            .field("notify", &self.notify.as_ref().map(|(_, t)| t))
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn new(ctx: RunContext, runner: impl ProcessRunner + 'static) -> Self {
        Self {
            ctx,
            runner: Box::new(runner),
            restore: None,
            upload: None,
            notify: None,
        }
    }

    pub fn with_restore(
        mut self,
        provisioner: impl DatabaseProvisioner + 'static,
        settings: RestoreSettings,
    ) -> Self {
        self.restore = Some((Box::new(provisioner), settings));
        self
    }

    pub fn with_upload(
        mut self,
        store: impl ObjectStore + 'static,
        settings: UploadSettings,
    ) -> Self {
        self.upload = Some((Box::new(store), settings));
        self
    }

    pub fn with_notify(mut self, notifier: impl Notifier + 'static, target: NotifyTarget) -> Self {
        self.notify = Some((Box::new(notifier), target));
        self
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    /// Run every stage in order. Never returns early.
    pub async fn run(self, log: &mut LogBuffer) -> RunReport {
        let Pipeline {
            ctx,
            runner,
            restore: restore_stage,
            upload: upload_stage,
            notify: notify_stage,
        } = self;

        let flags = ctx.flags;
        let dump_name = ctx.dump_filename();
        let dump_path = ctx.dump_path();
        let mut report = RunReport::new(ctx.token.clone());

        let outcome = export::export(
            runner.as_ref(),
            &ctx.api_key,
            &ctx.domain_ref(),
            &dump_path,
            log,
        )
        .await;
        report.record(Stage::Export, outcome);

        let outcome = match (flags.restore, &restore_stage) {
            (false, _) => StageOutcome::skipped("not requested"),
            (true, None) => not_configured("PostGIS restore", log),
            (true, Some((provisioner, settings))) => {
                let target = ctx.target_database(&settings.base_name);
                let outcome = restore::restore(
                    provisioner.as_ref(),
                    runner.as_ref(),
                    &settings.conn,
                    &target,
                    settings.drop_existing,
                    &dump_path,
                    log,
                )
                .await;
                report.target_database = Some(target);
                outcome
            }
        };
        report.record(Stage::Restore, outcome);

        let archive_path = compress_stage(&ctx, &dump_name, &mut report, log);
        cleanup_stage(archive_path.is_some(), &dump_path, &mut report, log);
        report.archive = archive_path.clone();

        let (outcome, removal) = match (flags.upload, &upload_stage, &archive_path) {
            (false, _, _) => (StageOutcome::skipped("not requested"), None),
            (true, None, _) => (not_configured("Amazon S3 upload", log), None),
            (true, Some(_), None) => {
                log.error("Nothing uploaded to Amazon S3: no archive was produced");
                (StageOutcome::skipped("no archive"), None)
            }
            (true, Some((store, settings)), Some(path)) => {
                let result = publish::upload(
                    store.as_ref(),
                    path,
                    &settings.bucket,
                    &settings.prefix,
                    flags.remove_local_after_upload,
                    log,
                )
                .await;
                (result.upload, result.removal)
            }
        };
        report.record(Stage::Upload, outcome);
        if let Some(removal) = removal {
            if removal.is_success() {
                report.archive = None;
            }
            report.record(Stage::RemoveArchive, removal);
        }

        let outcome = if !flags.notify {
            StageOutcome::skipped("not requested")
        } else if !flags.upload {
            log.warn("--amz_sns has no effect without --aws_s3upload");
            StageOutcome::skipped("upload not requested")
        } else {
            match &notify_stage {
                None => not_configured("Amazon SNS notification", log),
                Some((notifier, target)) => publish::notify(notifier.as_ref(), target, log).await,
            }
        };
        report.record(Stage::Notify, outcome);

        report
    }
}

fn not_configured(what: &str, log: &mut LogBuffer) -> StageOutcome {
    let msg = format!("{what} requested but not configured");
    log.error(msg.clone());
    StageOutcome::Failed(msg)
}

fn compress_stage(
    ctx: &RunContext,
    dump_name: &str,
    report: &mut RunReport,
    log: &mut LogBuffer,
) -> Option<PathBuf> {
    match archive::compress(ctx.output_dir(), dump_name) {
        Ok(path) => {
            log.info(format!("SQL file compressed: {}", path.display()));
            report.record(Stage::Compress, StageOutcome::Succeeded);
            Some(path)
        }
        Err(err) => {
            log.error(err.to_string());
            report.record(Stage::Compress, StageOutcome::Failed(err.to_string()));
            None
        }
    }
}

/// The dump is only deleted once a compressed copy exists.
fn cleanup_stage(
    compressed: bool,
    dump_path: &Path,
    report: &mut RunReport,
    log: &mut LogBuffer,
) {
    let outcome = if !compressed {
        StageOutcome::skipped("no archive; dump kept")
    } else {
        match archive::remove(dump_path) {
            Ok(()) => StageOutcome::Succeeded,
            Err(err) => {
                log.error(format!("Error removing sql file: {err}"));
                StageOutcome::Failed(err.to_string())
            }
        }
    };
    report.record(Stage::Cleanup, outcome);
}
