use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use cartodb_backup::errors::{BackupError, Result};
use cartodb_backup::exec::{CommandOutput, CommandSpec, ProcessRunner};
use cartodb_backup::logging::LogBuffer;
use cartodb_backup::publish::{Notifier, ObjectStore};
use cartodb_backup::restore::{ConnParams, DatabaseProvisioner};

pub const DEFAULT_DUMP: &[u8] = b"SET standard_conforming_strings = ON;\n\
CREATE TABLE \"public\".\"parks\" (\"cartodb_id\" SERIAL);\n\
COPY \"public\".\"parks\" (\"cartodb_id\") FROM STDIN;\n1\n2\n\\.\n";

/// A fake process runner that:
/// - records every command it is asked to run;
/// - writes a dump file when asked to run `ogr2ogr` (unless disabled);
/// - answers with configurable stderr or a launch error per program.
#[derive(Clone)]
pub struct FakeRunner {
    calls: Arc<Mutex<Vec<CommandSpec>>>,
    dump: Option<Vec<u8>>,
    stderr: HashMap<String, String>,
    missing: HashSet<String>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            dump: Some(DEFAULT_DUMP.to_vec()),
            stderr: HashMap::new(),
            missing: HashSet::new(),
        }
    }

    pub fn with_dump(mut self, content: impl Into<Vec<u8>>) -> Self {
        self.dump = Some(content.into());
        self
    }

    /// `ogr2ogr` "runs" but leaves no file behind.
    pub fn without_dump(mut self) -> Self {
        self.dump = None;
        self
    }

    pub fn with_stderr(mut self, program: &str, text: &str) -> Self {
        self.stderr.insert(program.to_string(), text.to_string());
        self
    }

    /// Pretend `program` is not installed.
    pub fn with_missing(mut self, program: &str) -> Self {
        self.missing.insert(program.to_string());
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.program).collect()
    }

    fn dump_target(spec: &CommandSpec) -> Option<PathBuf> {
        let pos = spec.args.iter().position(|a| a == "PGDump")?;
        spec.args.get(pos + 1).map(PathBuf::from)
    }
}

impl Default for FakeRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner for FakeRunner {
    fn run<'a>(
        &'a self,
        spec: &'a CommandSpec,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutput>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(spec.clone());

            if self.missing.contains(&spec.program) {
                return Err(BackupError::Launch {
                    program: spec.program.clone(),
                    reason: "No such file or directory (os error 2)".to_string(),
                });
            }

            if spec.program == "ogr2ogr" {
                if let (Some(content), Some(target)) = (&self.dump, Self::dump_target(spec)) {
                    std::fs::write(&target, content)?;
                }
            }

            Ok(CommandOutput {
                stdout: Vec::new(),
                stderr: self
                    .stderr
                    .get(&spec.program)
                    .map(|s| s.as_bytes().to_vec())
                    .unwrap_or_default(),
                exit_code: Some(0),
            })
        })
    }
}

/// A fake provisioner that records `(target, drop_first)` and either logs
/// the same lines as the real one or fails before creating anything.
#[derive(Clone, Default)]
pub struct FakeProvisioner {
    created: Arc<Mutex<Vec<(String, bool)>>>,
    failure: Option<String>,
}

impl FakeProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an unreachable admin database.
    pub fn failing(reason: &str) -> Self {
        Self {
            created: Arc::new(Mutex::new(Vec::new())),
            failure: Some(reason.to_string()),
        }
    }

    pub fn created(&self) -> Vec<(String, bool)> {
        self.created.lock().unwrap().clone()
    }
}

impl DatabaseProvisioner for FakeProvisioner {
    fn provision<'a>(
        &'a self,
        _conn: &'a ConnParams,
        target: &'a str,
        drop_first: bool,
        log: &'a mut LogBuffer,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            if let Some(reason) = &self.failure {
                return Err(BackupError::Provision(reason.clone()));
            }
            if drop_first {
                log.info(format!("Database {target} removed"));
            }
            self.created
                .lock()
                .unwrap()
                .push((target.to_string(), drop_first));
            log.info(format!("Database {target} created"));
            log.info(format!("Added PostGIS extension to {target}"));
            Ok(())
        })
    }
}

/// Stored object as seen by [`FakeStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub body: Vec<u8>,
}

/// In-memory object store.
#[derive(Clone, Default)]
pub struct FakeStore {
    objects: Arc<Mutex<Vec<StoredObject>>>,
    failure: Option<String>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            objects: Arc::new(Mutex::new(Vec::new())),
            failure: Some(reason.to_string()),
        }
    }

    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects.lock().unwrap().clone()
    }
}

impl ObjectStore for FakeStore {
    fn put_object<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
        body: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            if let Some(reason) = &self.failure {
                return Err(BackupError::Upload(reason.clone()));
            }
            self.objects.lock().unwrap().push(StoredObject {
                bucket: bucket.to_string(),
                key: key.to_string(),
                body,
            });
            Ok(())
        })
    }
}

/// Published message as seen by [`FakeNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub topic_arn: String,
    pub subject: String,
    pub body: String,
}

#[derive(Clone, Default)]
pub struct FakeNotifier {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    failure: Option<String>,
}

impl FakeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            failure: Some(reason.to_string()),
        }
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for FakeNotifier {
    fn publish<'a>(
        &'a self,
        topic_arn: &'a str,
        subject: &'a str,
        message: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            if let Some(reason) = &self.failure {
                return Err(BackupError::Notify(reason.clone()));
            }
            self.sent.lock().unwrap().push(SentMessage {
                topic_arn: topic_arn.to_string(),
                subject: subject.to_string(),
                body: message.to_string(),
            });
            Ok(())
        })
    }
}
