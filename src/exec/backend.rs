// src/exec/backend.rs

//! Pluggable process runner abstraction.
//!
//! The pipeline talks to a `ProcessRunner` instead of spawning processes
//! itself. `RealProcessRunner` is the production implementation; tests
//! provide their own runner that records argv and fakes the output files.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::errors::{BackupError, Result};

use super::command::{CommandOutput, CommandSpec};

/// Trait abstracting how external commands are executed.
pub trait ProcessRunner: Send + Sync {
    /// Run `spec` to completion and return its captured output.
    ///
    /// Errors:
    /// - [`BackupError::Launch`] when the program cannot be started
    ///   (missing executable, empty or invalid argv);
    /// - [`BackupError::Execution`] for any failure after that point.
    fn run<'a>(
        &'a self,
        spec: &'a CommandSpec,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutput>> + Send + 'a>>;
}

/// Runner backed by `tokio::process::Command`.
#[derive(Debug, Clone, Default)]
pub struct RealProcessRunner {
    timeout: Option<Duration>,
}

impl RealProcessRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    async fn run_inner(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        if spec.program.trim().is_empty() {
            return Err(BackupError::Launch {
                program: spec.program.clone(),
                reason: "empty argument vector".to_string(),
            });
        }

        debug!(command = %spec, "spawning external command");

        let stdout = if spec.capture_stdout {
            Stdio::piped()
        } else {
            Stdio::null()
        };

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| classify_spawn_error(&spec.program, e))?;

        // Dropping the future on timeout drops the child, which kills it.
        let waited = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| BackupError::Execution {
                    program: spec.program.clone(),
                    reason: format!("timed out after {}s", limit.as_secs_f64()),
                })?,
            None => child.wait_with_output().await,
        };

        let output = waited.map_err(|e| BackupError::Execution {
            program: spec.program.clone(),
            reason: e.to_string(),
        })?;

        debug!(
            command = %spec,
            exit_code = ?output.status.code(),
            stderr_bytes = output.stderr.len(),
            "external command exited"
        );

        Ok(CommandOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code(),
        })
    }
}

impl ProcessRunner for RealProcessRunner {
    fn run<'a>(
        &'a self,
        spec: &'a CommandSpec,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutput>> + Send + 'a>> {
        Box::pin(self.run_inner(spec))
    }
}

fn classify_spawn_error(program: &str, err: io::Error) -> BackupError {
    match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::InvalidInput | io::ErrorKind::PermissionDenied => {
            BackupError::Launch {
                program: program.to_string(),
                reason: err.to_string(),
            }
        }
        _ => BackupError::Execution {
            program: program.to_string(),
            reason: err.to_string(),
        },
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_executable_is_a_launch_error() {
        let runner = RealProcessRunner::default();
        let spec = CommandSpec::new("definitely-not-installed-cartodb-tool");
        match runner.run(&spec).await {
            Err(BackupError::Launch { program, .. }) => {
                assert_eq!(program, "definitely-not-installed-cartodb-tool")
            }
            other => panic!("expected Launch error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_program_is_a_launch_error() {
        let runner = RealProcessRunner::default();
        let err = runner.run(&CommandSpec::new("")).await.unwrap_err();
        assert!(matches!(err, BackupError::Launch { .. }));
    }

    #[tokio::test]
    async fn stderr_and_env_are_captured() {
        let runner = RealProcessRunner::default();
        let spec = CommandSpec::new("sh")
            .args(["-c", "printf \"$GREETING\"; printf oops >&2"])
            .env("GREETING", "hello");

        let out = runner.run(&spec).await.unwrap();
        assert_eq!(out.stdout, b"hello");
        assert_eq!(out.stderr_text(), "oops");
        assert_eq!(out.exit_code, Some(0));
        assert!(out.reported_error());
    }

    #[tokio::test]
    async fn arguments_are_not_shell_expanded() {
        let runner = RealProcessRunner::default();
        let spec = CommandSpec::new("echo").arg("$HOME; rm -rf /");
        let out = runner.run(&spec).await.unwrap();
        assert_eq!(String::from_utf8_lossy(&out.stdout).trim_end(), "$HOME; rm -rf /");
    }

    #[tokio::test]
    async fn discarded_stdout_is_empty() {
        let runner = RealProcessRunner::default();
        let spec = CommandSpec::new("echo").arg("noise").discard_stdout();
        let out = runner.run(&spec).await.unwrap();
        assert!(out.stdout.is_empty());
        assert!(!out.reported_error());
    }

    #[tokio::test]
    async fn timeout_is_an_execution_error() {
        let runner = RealProcessRunner::new(Some(Duration::from_millis(100)));
        let spec = CommandSpec::new("sleep").arg("5");
        match runner.run(&spec).await {
            Err(BackupError::Execution { reason, .. }) => assert!(reason.contains("timed out")),
            other => panic!("expected Execution error, got {other:?}"),
        }
    }
}
