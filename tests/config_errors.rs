// tests/config_errors.rs

use std::io::Write;

use cartodb_backup::config::load_and_validate;
use cartodb_backup::errors::BackupError;
use cartodb_backup::types::RunFlags;
use tempfile::NamedTempFile;

const MINIMAL: &str = r#"
[cartodb]
api_key = "k"
domain = "acme"
sql_folder = "/tmp/cartodb"
"#;

fn write_config(body: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{body}").unwrap();
    file
}

#[test]
fn minimal_config_is_enough_for_export_only() {
    let file = write_config(MINIMAL);
    let cfg = load_and_validate(file.path(), &RunFlags::default()).unwrap();
    assert_eq!(cfg.cartodb.domain, "acme");
    assert!(cfg.postgis.is_none());
    assert!(cfg.aws.is_none());
}

#[test]
fn missing_api_key_is_a_config_error() {
    let file = write_config(
        r#"
[cartodb]
api_key = ""
domain = "acme"
sql_folder = "/tmp/cartodb"
"#,
    );

    match load_and_validate(file.path(), &RunFlags::default()) {
        Err(BackupError::Config(msg)) => assert!(msg.contains("api_key")),
        Err(e) => panic!("Expected Config error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn missing_cartodb_section_fails_to_parse() {
    let file = write_config("[runner]\ntimeout_secs = 5\n");
    let err = load_and_validate(file.path(), &RunFlags::default()).unwrap_err();
    assert!(matches!(err, BackupError::Toml(_)), "{err:?}");
    assert!(err.is_fatal());
}

#[test]
fn restore_flag_requires_postgis_section() {
    let file = write_config(MINIMAL);
    let flags = RunFlags {
        restore: true,
        ..RunFlags::default()
    };

    match load_and_validate(file.path(), &flags) {
        Err(BackupError::Config(msg)) => assert!(msg.contains("postgis")),
        other => panic!("Expected Config error, got: {:?}", other.map(|_| ())),
    }
}

#[test]
fn upload_flag_requires_aws_section() {
    let file = write_config(MINIMAL);
    let flags = RunFlags {
        upload: true,
        ..RunFlags::default()
    };

    match load_and_validate(file.path(), &flags) {
        Err(BackupError::Config(msg)) => assert!(msg.contains("aws")),
        other => panic!("Expected Config error, got: {:?}", other.map(|_| ())),
    }
}

#[test]
fn postgis_defaults_are_filled_in() {
    let file = write_config(&format!(
        r#"{MINIMAL}
[postgis]
database = "postgres"
user = "admin"
new_database = "mirror"
"#
    ));
    let flags = RunFlags {
        restore: true,
        ..RunFlags::default()
    };

    let cfg = load_and_validate(file.path(), &flags).unwrap();
    let pg = cfg.postgis.unwrap();
    assert_eq!(pg.host, "localhost");
    assert_eq!(pg.port, 5432);
    assert!(!pg.drop_existing);
    assert!(pg.password.is_none());
}
