// src/exec/mod.rs

//! Process execution layer.
//!
//! External tools (`ogr2ogr`, `psql`) are run through a [`ProcessRunner`] so
//! the pipeline never touches `tokio::process` directly.
//!
//! - [`command`] holds the argv + environment description of a command and
//!   the captured output.
//! - [`backend`] provides the `ProcessRunner` trait and the production
//!   `RealProcessRunner`; tests substitute a fake that writes files instead
//!   of spawning processes.

pub mod backend;
pub mod command;

pub use backend::{ProcessRunner, RealProcessRunner};
pub use command::{CommandOutput, CommandSpec};
