// src/pipeline/mod.rs

//! Backup pipeline orchestration.
//!
//! The pipeline is a straight line:
//!
//! ```text
//! export -> [restore] -> compress -> cleanup -> [upload -> [remove archive]] -> [notify]
//! ```
//!
//! No stage can abort the run. Each one logs into the shared [`LogBuffer`]
//! and leaves a [`StageOutcome`] in the [`RunReport`]; the next stage runs
//! regardless, even when its input is likely missing.
//!
//! - [`orchestrator`] owns the stage order and the wiring of backends.
//! - [`report`] holds the per-stage results handed back to the caller.
//!
//! [`LogBuffer`]: crate::logging::LogBuffer

pub mod orchestrator;
pub mod report;

pub use orchestrator::{Pipeline, RestoreSettings, UploadSettings};
pub use report::{RunReport, Stage, StageOutcome, StageReport};
