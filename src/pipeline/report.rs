// src/pipeline/report.rs

use std::fmt;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::types::TimestampToken;

/// Steps of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Export,
    Restore,
    Compress,
    /// Removal of the uncompressed SQL dump.
    Cleanup,
    Upload,
    /// Removal of the local archive after upload.
    RemoveArchive,
    Notify,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Export => "export",
            Stage::Restore => "restore",
            Stage::Compress => "compress",
            Stage::Cleanup => "cleanup",
            Stage::Upload => "upload",
            Stage::RemoveArchive => "remove-archive",
            Stage::Notify => "notify",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Succeeded,
    /// The stage ran and failed; carries the error text.
    Failed(String),
    /// The stage did not run; carries the reason.
    Skipped(String),
}

impl StageOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        StageOutcome::Skipped(reason.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StageOutcome::Succeeded)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, StageOutcome::Failed(_))
    }
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageOutcome::Succeeded => f.write_str("ok"),
            StageOutcome::Failed(e) => write!(f, "failed ({e})"),
            StageOutcome::Skipped(r) => write!(f, "skipped ({r})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: Stage,
    pub outcome: StageOutcome,
}

/// Everything a finished run produced, in stage order.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub token: TimestampToken,
    pub stages: Vec<StageReport>,
    /// Local archive, if one was written and still exists.
    pub archive: Option<PathBuf>,
    /// Restore target, if the restore stage ran.
    pub target_database: Option<String>,
}

impl RunReport {
    pub fn new(token: TimestampToken) -> Self {
        Self {
            token,
            stages: Vec::new(),
            archive: None,
            target_database: None,
        }
    }

    pub fn record(&mut self, stage: Stage, outcome: StageOutcome) {
        self.stages.push(StageReport { stage, outcome });
    }

    pub fn outcome(&self, stage: Stage) -> Option<&StageOutcome> {
        self.stages
            .iter()
            .find(|r| r.stage == stage)
            .map(|r| &r.outcome)
    }

    pub fn has_failures(&self) -> bool {
        self.stages.iter().any(|r| r.outcome.is_failure())
    }

    pub fn failed_stages(&self) -> Vec<Stage> {
        self.stages
            .iter()
            .filter(|r| r.outcome.is_failure())
            .map(|r| r.stage)
            .collect()
    }

    /// One tracing line per stage, then a verdict.
    pub fn log_summary(&self) {
        for r in &self.stages {
            info!(run = %self.token, stage = %r.stage, outcome = %r.outcome, "stage result");
        }

        let failed = self.failed_stages();
        if failed.is_empty() {
            info!(run = %self.token, "backup run finished without errors");
        } else {
            warn!(run = %self.token, ?failed, "backup run finished with failed stages");
        }
    }
}
