// src/config/mod.rs

//! Configuration loading and validation for cartodb_backup.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Locate and load the config file (`loader.rs`).
//! - Validate required keys and stage prerequisites (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, resolve_config_path, resolve_password};
pub use model::{
    AwsSection, CONFIG_FILE_NAME, CartodbSection, ConfigFile, PostgisSection, RawConfigFile,
    RunnerSection, SnsSection,
};
