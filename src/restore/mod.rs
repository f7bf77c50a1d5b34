// src/restore/mod.rs

//! Optional replay of the SQL dump into a fresh PostGIS database.
//!
//! - [`provision`] creates the target database and enables `postgis`.
//! - [`restore`] runs the provisioner, then replays the dump with `psql`.

pub mod provision;

use std::path::Path;

pub use provision::{ConnParams, DatabaseProvisioner, PostgresProvisioner, quote_ident};

use crate::errors::BackupError;
use crate::exec::{CommandSpec, ProcessRunner};
use crate::logging::LogBuffer;
use crate::pipeline::StageOutcome;

/// Build the `psql` replay invocation.
///
/// The password is handed over through `PGPASSWORD` so `psql` never stops
/// to prompt; its `-a` echo is discarded.
pub fn replay_command(conn: &ConnParams, target: &str, dump: &Path) -> CommandSpec {
    let spec = CommandSpec::new("psql")
        .args(["-h", conn.host.as_str()])
        .args(["-p".to_string(), conn.port.to_string()])
        .args(["-d", target])
        .args(["-U", conn.user.as_str()])
        .arg("-a")
        .arg("-f")
        .arg(dump.to_string_lossy())
        .discard_stdout();

    match &conn.password {
        Some(password) => spec.env("PGPASSWORD", password.as_str()),
        None => spec,
    }
}

/// Provision `target`, then replay `dump` into it.
///
/// A provisioning failure skips the replay; nothing here ever aborts the run.
pub async fn restore(
    provisioner: &dyn DatabaseProvisioner,
    runner: &dyn ProcessRunner,
    conn: &ConnParams,
    target: &str,
    drop_first: bool,
    dump: &Path,
    log: &mut LogBuffer,
) -> StageOutcome {
    log.info("PostGIS: creating DB...");

    if let Err(err) = provisioner.provision(conn, target, drop_first, log).await {
        log.error(err.to_string());
        return StageOutcome::Failed(err.to_string());
    }

    let spec = replay_command(conn, target, dump);
    match runner.run(&spec).await {
        Ok(out) if out.reported_error() => {
            let stderr = out.stderr_text();
            log.error(format!("CartoDB to PostGIS Import Error: {stderr}"));
            StageOutcome::Failed(stderr)
        }
        Ok(_) => {
            log.info("CartoDB to PostGIS Import: successfully process!");
            StageOutcome::Succeeded
        }
        Err(err @ BackupError::Launch { .. }) => {
            log.error(format!("Check your postgresql-client installation: {err}"));
            StageOutcome::Failed(err.to_string())
        }
        Err(err) => {
            log.error(format!("CartoDB to PostGIS Import Error: {err}"));
            StageOutcome::Failed(err.to_string())
        }
    }
}
