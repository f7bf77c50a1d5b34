// src/export.rs

//! Dump a whole CartoDB domain to a local SQL file with `ogr2ogr`.

use std::path::Path;

use crate::errors::BackupError;
use crate::exec::{CommandSpec, ProcessRunner};
use crate::logging::LogBuffer;
use crate::pipeline::StageOutcome;

/// Build the `ogr2ogr` invocation.
///
/// - `PG_USE_COPY=YES` makes the PGDump driver emit `COPY` blocks.
/// - The API key travels as a driver config option, never inside the
///   data source name.
/// - `DROP_TABLE=OFF` keeps existing table definitions on replay.
pub fn export_command(api_key: &str, domain_ref: &str, output: &Path) -> CommandSpec {
    CommandSpec::new("ogr2ogr")
        .args(["--config", "PG_USE_COPY", "YES"])
        .args(["--config", "CARTODB_API_KEY", api_key])
        .args(["-f", "PGDump"])
        .arg(output.to_string_lossy())
        .arg(domain_ref)
        .args(["-lco", "DROP_TABLE=OFF"])
}

/// Run the export. Never fails the pipeline: the dump may be partially
/// usable even when `ogr2ogr` complained, so later stages always run.
pub async fn export(
    runner: &dyn ProcessRunner,
    api_key: &str,
    domain_ref: &str,
    output: &Path,
    log: &mut LogBuffer,
) -> StageOutcome {
    log.info("Start backup process...");

    let spec = export_command(api_key, domain_ref, output);
    match runner.run(&spec).await {
        Ok(out) if out.reported_error() => {
            let stderr = out.stderr_text();
            log.error(format!("Export error: {stderr}"));
            StageOutcome::Failed(stderr)
        }
        Ok(_) => {
            log.info("Export: successfully process!");
            StageOutcome::Succeeded
        }
        Err(err @ BackupError::Launch { .. }) => {
            log.error(format!("Check your GDAL >= 1.11 installation: {err}"));
            StageOutcome::Failed(err.to_string())
        }
        Err(err) => {
            log.error(format!("Export error: {err}"));
            StageOutcome::Failed(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn command_keeps_key_out_of_data_source() {
        let out = PathBuf::from("/tmp/bk/cartodb_backup_20240101_000000.sql");
        let spec = export_command("s3cr3t", "CartoDB:acme", &out);

        assert_eq!(
            spec.argv(),
            vec![
                "ogr2ogr",
                "--config",
                "PG_USE_COPY",
                "YES",
                "--config",
                "CARTODB_API_KEY",
                "s3cr3t",
                "-f",
                "PGDump",
                "/tmp/bk/cartodb_backup_20240101_000000.sql",
                "CartoDB:acme",
                "-lco",
                "DROP_TABLE=OFF",
            ]
        );
    }
}
