// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Only configuration failures (`Config`, `Toml`) are fatal; every other
//! variant is caught at the pipeline stage that produced it and turned into a
//! logged stage failure.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Could not launch '{program}': {reason}")]
    Launch { program: String, reason: String },

    #[error("Command '{program}' failed: {reason}")]
    Execution { program: String, reason: String },

    #[error("Database creation error: {0}")]
    Provision(String),

    #[error("Zip compression error: {0}")]
    Compression(String),

    #[error("File error on {path}: {reason}")]
    Filesystem { path: String, reason: String },

    #[error("AWS S3 error: {0}")]
    Upload(String),

    #[error("AWS SNS error: {0}")]
    Notify(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BackupError {
    /// `true` for errors that abort a run before any stage starts.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BackupError::Config(_) | BackupError::Toml(_))
    }
}

impl From<tokio_postgres::Error> for BackupError {
    fn from(err: tokio_postgres::Error) -> Self {
        BackupError::Provision(err.to_string())
    }
}

impl From<zip::result::ZipError> for BackupError {
    fn from(err: zip::result::ZipError) -> Self {
        BackupError::Compression(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BackupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_are_the_only_fatal_kind() {
        assert!(BackupError::Config("missing [cartodb]".into()).is_fatal());
        assert!(!BackupError::Upload("denied".into()).is_fatal());
        assert!(!BackupError::Provision("refused".into()).is_fatal());
    }

    #[test]
    fn launch_error_names_the_program() {
        let err = BackupError::Launch {
            program: "ogr2ogr".into(),
            reason: "not found".into(),
        };
        assert_eq!(err.to_string(), "Could not launch 'ogr2ogr': not found");
    }

    #[test]
    fn zip_errors_map_to_compression() {
        let err: BackupError = zip::result::ZipError::FileNotFound.into();
        assert!(matches!(err, BackupError::Compression(_)));
    }
}
