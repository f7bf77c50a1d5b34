// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{CONFIG_FILE_NAME, ConfigFile, PostgisSection, RawConfigFile};
use crate::errors::{BackupError, Result};
use crate::types::RunFlags;

/// Turn the CLI `CONFIG` argument into the path of the TOML file.
///
/// A directory is searched for [`CONFIG_FILE_NAME`]; anything else is taken
/// as the file itself.
pub fn resolve_config_path(location: impl AsRef<Path>) -> PathBuf {
    let location = location.as_ref();
    if location.is_dir() {
        location.join(CONFIG_FILE_NAME)
    } else {
        location.to_path_buf()
    }
}

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        BackupError::Config(format!("reading config file at {}: {e}", path.display()))
    })?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load, validate and check the config against the requested stages.
///
/// Every failure here is fatal: the run stops before the export starts.
pub fn load_and_validate(location: impl AsRef<Path>, flags: &RunFlags) -> Result<ConfigFile> {
    let path = resolve_config_path(location);
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    config.validate_for(flags)?;
    Ok(config)
}

/// Password for the `[postgis]` user.
///
/// A configured non-empty password is used as is; otherwise the operator is
/// asked on the terminal without echo. Failing to read the answer is a
/// configuration error.
pub fn resolve_password(section: &PostgisSection) -> Result<String> {
    if let Some(password) = section.password.as_deref().filter(|p| !p.is_empty()) {
        return Ok(password.to_string());
    }

    let prompt = format!("Enter password for user {}: ", section.user);
    rpassword::prompt_password(prompt)
        .map_err(|e| BackupError::Config(format!("reading PostgreSQL password: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_is_searched_for_default_file_name() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            resolve_config_path(dir.path()),
            dir.path().join("cartodbbkconfig.toml")
        );
    }

    #[test]
    fn explicit_file_path_is_kept() {
        let path = PathBuf::from("/nonexistent/custom.toml");
        assert_eq!(resolve_config_path(&path), path);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        match load_and_validate(dir.path(), &RunFlags::default()) {
            Err(BackupError::Config(msg)) => assert!(msg.contains("cartodbbkconfig.toml")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn configured_password_skips_prompt() {
        let section = PostgisSection {
            database: "postgres".into(),
            user: "admin".into(),
            password: Some("pw".into()),
            host: "localhost".into(),
            port: 5432,
            new_database: "mirror".into(),
            drop_existing: true,
        };
        assert_eq!(resolve_password(&section).unwrap(), "pw");
    }

    #[test]
    fn malformed_toml_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[cartodb\napi_key=").unwrap();
        let err = load_and_validate(dir.path(), &RunFlags::default()).unwrap_err();
        assert!(err.is_fatal());
    }
}
