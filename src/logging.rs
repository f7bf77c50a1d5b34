// src/logging.rs

//! Logging for `cartodb_backup`.
//!
//! Two sinks are involved:
//! - the global `tracing` subscriber installed by [`init_logging`], which
//!   writes human-readable lines to STDERR;
//! - a run-scoped [`LogBuffer`] that every pipeline stage appends to. The
//!   buffer forwards each record to `tracing` and keeps a copy so the run
//!   summary can be sent as a notification body at the end.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `CARTODB_BACKUP_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`

use std::fmt;

use anyhow::Result;
use chrono::{DateTime, Local};
use tracing_subscriber::fmt::time::ChronoLocal;

use crate::cli::LogLevel;

/// Timestamp layout shared by console output and buffered records.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => std::env::var("CARTODB_BACKUP_LOG")
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(tracing::Level::INFO),
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}

/// Severity of a buffered record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// One line of the run's audit trail.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Local>,
    pub severity: Severity,
    pub message: String,
}

impl LogRecord {
    /// `[<timestamp> <SEVERITY>] - <message>`
    pub fn render(&self) -> String {
        format!(
            "[{} {}] - {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.severity,
            self.message
        )
    }
}

/// Append-only record of everything a run logged.
///
/// Owned by the pipeline and lent mutably to each stage in turn; records are
/// never removed, so a snapshot taken late in the run still holds the export
/// and restore lines.
#[derive(Debug, Default)]
pub struct LogBuffer {
    records: Vec<LogRecord>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Severity::Info, message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(Severity::Warning, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Severity::Error, message.into());
    }

    fn push(&mut self, severity: Severity, message: String) {
        match severity {
            Severity::Info => tracing::info!("{message}"),
            Severity::Warning => tracing::warn!("{message}"),
            Severity::Error => tracing::error!("{message}"),
        }

        self.records.push(LogRecord {
            timestamp: Local::now(),
            severity,
            message,
        });
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index of the first record whose message contains `needle`.
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.records.iter().position(|r| r.message.contains(needle))
    }

    pub fn has_errors(&self) -> bool {
        self.records.iter().any(|r| r.severity == Severity::Error)
    }

    /// Every record rendered on its own line, oldest first.
    pub fn render(&self) -> String {
        self.records
            .iter()
            .map(LogRecord::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn record_renders_bracketed_prefix() {
        let record = LogRecord {
            timestamp: Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap(),
            severity: Severity::Error,
            message: "Export error: boom".to_string(),
        };
        assert_eq!(record.render(), "[2024-03-09 14:05:07 ERROR] - Export error: boom");
    }

    #[test]
    fn buffer_keeps_order_and_joins_with_newlines() {
        let mut log = LogBuffer::new();
        log.info("first");
        log.error("second");
        log.warn("third");

        assert_eq!(log.len(), 3);
        assert!(log.has_errors());
        assert_eq!(log.position("second"), Some(1));

        let rendered = log.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("INFO] - first"));
        assert!(lines[1].ends_with("ERROR] - second"));
        assert!(lines[2].ends_with("WARNING] - third"));
    }

    #[test]
    fn level_strings_parse_case_insensitively() {
        assert_eq!(parse_level_str(" DEBUG "), Some(tracing::Level::DEBUG));
        assert_eq!(parse_level_str("warning"), Some(tracing::Level::WARN));
        assert_eq!(parse_level_str("loud"), None);
    }
}
