// src/exec/command.rs

use std::fmt;

/// A command described as a discrete argument vector.
///
/// Arguments are never joined into a shell string, so domain names and keys
/// coming from the config cannot inject shell syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Extra environment variables for the child only.
    pub env: Vec<(String, String)>,
    /// When false stdout goes to `/dev/null` instead of memory.
    pub capture_stdout: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            capture_stdout: true,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// For tools that echo their whole input (`psql -a`).
    pub fn discard_stdout(mut self) -> Self {
        self.capture_stdout = false;
        self
    }

    /// Full argument vector, program first.
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}

/// Program name only; arguments may hold credentials.
impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} args)", self.program, self.args.len())
    }
}

/// What a finished process left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    /// Anything on stderr counts as a failure signal, whatever the exit code.
    ///
    /// Benign warnings therefore show up as errors, and a tool that fails
    /// silently passes. Kept for compatibility with existing log consumers.
    pub fn reported_error(&self) -> bool {
        !self.stderr.is_empty()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argv_starts_with_program() {
        let spec = CommandSpec::new("psql").args(["-h", "db"]).arg("-a");
        assert_eq!(spec.argv(), vec!["psql", "-h", "db", "-a"]);
    }

    #[test]
    fn display_hides_arguments() {
        let spec = CommandSpec::new("ogr2ogr").args(["--config", "CARTODB_API_KEY", "secret"]);
        let shown = spec.to_string();
        assert!(!shown.contains("secret"));
        assert_eq!(shown, "ogr2ogr (3 args)");
    }

    #[test]
    fn stderr_decides_failure_not_exit_code() {
        let noisy_success = CommandOutput {
            stderr: b"Warning 1: layer skipped\n".to_vec(),
            exit_code: Some(0),
            ..CommandOutput::default()
        };
        assert!(noisy_success.reported_error());
        assert_eq!(noisy_success.stderr_text(), "Warning 1: layer skipped");

        let silent_failure = CommandOutput {
            exit_code: Some(1),
            ..CommandOutput::default()
        };
        assert!(!silent_failure.reported_error());
    }
}
