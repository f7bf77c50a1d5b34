// src/restore/provision.rs

//! Creation of the PostGIS database the dump is replayed into.

use std::future::Future;
use std::pin::Pin;

use tokio_postgres::{Client, NoTls};
use tracing::debug;

use crate::config::PostgisSection;
use crate::errors::{BackupError, Result};
use crate::logging::LogBuffer;

/// Where and as whom to connect.
#[derive(Clone)]
pub struct ConnParams {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    /// Bootstrap database used for `CREATE DATABASE`.
    pub admin_database: String,
}

impl ConnParams {
    pub fn from_section(section: &PostgisSection, password: Option<String>) -> Self {
        Self {
            host: section.host.clone(),
            port: section.port,
            user: section.user.clone(),
            password: password.or_else(|| section.password.clone()),
            admin_database: section.database.clone(),
        }
    }
}

impl std::fmt::Debug for ConnParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("admin_database", &self.admin_database)
            .finish()
    }
}

/// Quote `name` as a SQL identifier, doubling embedded quotes.
///
/// `CREATE DATABASE` cannot take bind parameters, so names coming from the
/// config go through this instead of being pasted into the statement.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Trait abstracting database provisioning so the pipeline can be tested
/// without a PostgreSQL server.
pub trait DatabaseProvisioner: Send + Sync {
    /// Create `target` (dropping it first when `drop_first`) and enable the
    /// `postgis` extension in it.
    ///
    /// Any connection or statement failure is a [`BackupError::Provision`].
    fn provision<'a>(
        &'a self,
        conn: &'a ConnParams,
        target: &'a str,
        drop_first: bool,
        log: &'a mut LogBuffer,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Provisioner backed by `tokio-postgres`.
#[derive(Debug, Clone, Default)]
pub struct PostgresProvisioner;

impl PostgresProvisioner {
    async fn connect(conn: &ConnParams, dbname: &str) -> Result<Client> {
        let mut cfg = tokio_postgres::Config::new();
        cfg.host(&conn.host)
            .port(conn.port)
            .user(&conn.user)
            .dbname(dbname);
        if let Some(password) = &conn.password {
            cfg.password(password);
        }

        let (client, connection) = cfg.connect(NoTls).await.map_err(|e| {
            BackupError::Provision(format!(
                "connecting to {dbname} on {}:{}: {e}",
                conn.host, conn.port
            ))
        })?;

        let db = dbname.to_string();
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                debug!(database = %db, error = %e, "postgres connection ended with error");
            }
        });

        Ok(client)
    }

    async fn provision_inner(
        conn: &ConnParams,
        target: &str,
        drop_first: bool,
        log: &mut LogBuffer,
    ) -> Result<()> {
        let quoted = quote_ident(target);

        // Simple-query statements outside a transaction block run in
        // autocommit mode, which CREATE/DROP DATABASE require.
        let admin = Self::connect(conn, &conn.admin_database).await?;

        if drop_first {
            admin
                .batch_execute(&format!("DROP DATABASE IF EXISTS {quoted}"))
                .await?;
            log.info(format!("Database {target} removed"));
        }

        admin
            .batch_execute(&format!("CREATE DATABASE {quoted}"))
            .await?;
        drop(admin);
        log.info(format!("Database {target} created"));

        // A session cannot switch databases, so open a second one on the target.
        let mut client = Self::connect(conn, target).await?;
        let tx = client.transaction().await?;
        tx.batch_execute("CREATE EXTENSION postgis").await?;
        tx.commit().await?;
        drop(client);
        log.info(format!("Added PostGIS extension to {target}"));

        Ok(())
    }
}

impl DatabaseProvisioner for PostgresProvisioner {
    fn provision<'a>(
        &'a self,
        conn: &'a ConnParams,
        target: &'a str,
        drop_first: bool,
        log: &'a mut LogBuffer,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(Self::provision_inner(conn, target, drop_first, log))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quote_ident("mirror_20240101_000000"), "\"mirror_20240101_000000\"");
        assert_eq!(
            quote_ident("x\"; DROP DATABASE prod; --"),
            "\"x\"\"; DROP DATABASE prod; --\""
        );
    }

    #[test]
    fn prompted_password_wins_over_config() {
        let section = PostgisSection {
            database: "postgres".into(),
            user: "admin".into(),
            password: Some("from-config".into()),
            host: "db".into(),
            port: 5433,
            new_database: "mirror".into(),
            drop_existing: true,
        };

        let conn = ConnParams::from_section(&section, None);
        assert_eq!(conn.password.as_deref(), Some("from-config"));
        assert_eq!(conn.admin_database, "postgres");

        let conn = ConnParams::from_section(&section, Some("typed".into()));
        assert_eq!(conn.password.as_deref(), Some("typed"));
    }

    #[test]
    fn debug_output_masks_password() {
        let conn = ConnParams {
            host: "db".into(),
            port: 5432,
            user: "admin".into(),
            password: Some("hunter2".into()),
            admin_database: "postgres".into(),
        };
        let shown = format!("{conn:?}");
        assert!(!shown.contains("hunter2"));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_provision_error_and_logs_nothing() {
        let conn = ConnParams {
            host: "127.0.0.1".into(),
            port: 1,
            user: "nobody".into(),
            password: None,
            admin_database: "postgres".into(),
        };
        let mut log = LogBuffer::new();
        let err = PostgresProvisioner
            .provision(&conn, "mirror_x", true, &mut log)
            .await
            .unwrap_err();

        assert!(matches!(err, BackupError::Provision(_)));
        assert!(log.position("created").is_none());
    }
}
