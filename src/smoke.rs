//! Smoke-test pipeline against the bound postgres instance.
//!
//! Three sequential operations, each short-circuiting on failure: connect,
//! create a schema, create a table inside it. The pipeline owns a single
//! connection for its whole lifetime; there is no pool, no retry, and no
//! rollback of the created objects on a later failure (cleanup is the
//! provisioner's problem, not the probe's).

use sqlx::postgres::{PgConnectOptions, PgSslMode};
use sqlx::{Connection, PgConnection};

use crate::bindings::ServiceCredentials;
use crate::config::{CREATE_SCHEMA_SQL, CREATE_TABLE_SQL, SCHEMA_NAME};

/// Result of a smoke-test run.
///
/// Only observable through logs and through whether the health server starts:
/// the outcome is never persisted.
#[derive(Debug)]
pub enum TestOutcome {
    Success,
    Failure(SmokeError),
}

impl TestOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TestOutcome::Success)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SmokeError {
    #[error("Failed to connect to postgres at {host}:{port}: {source}")]
    Connection {
        host: String,
        port: u16,
        #[source]
        source: sqlx::Error,
    },

    #[error("Statement `{statement}` failed: {source}")]
    Query {
        statement: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

/// Run the smoke test against the resolved credentials.
pub async fn run(credentials: &ServiceCredentials) -> TestOutcome {
    match pipeline(credentials).await {
        Ok(()) => TestOutcome::Success,
        Err(err) => TestOutcome::Failure(err),
    }
}

async fn pipeline(credentials: &ServiceCredentials) -> Result<(), SmokeError> {
    let mut conn = connect(credentials).await?;
    create_schema(&mut conn).await?;
    create_table(&mut conn).await?;
    Ok(())
}

async fn connect(credentials: &ServiceCredentials) -> Result<PgConnection, SmokeError> {
    tracing::info!(
        hostname = %credentials.hostname,
        port = credentials.port,
        database = %credentials.name,
        "Connecting to postgres"
    );

    PgConnection::connect_with(&connect_options(credentials))
        .await
        .map_err(|source| SmokeError::Connection {
            host: credentials.hostname.clone(),
            port: credentials.port,
            source,
        })
}

async fn create_schema(conn: &mut PgConnection) -> Result<(), SmokeError> {
    tracing::info!(schema = SCHEMA_NAME, "Creating schema");
    sqlx::query(CREATE_SCHEMA_SQL)
        .execute(&mut *conn)
        .await
        .map_err(|source| SmokeError::Query {
            statement: CREATE_SCHEMA_SQL,
            source,
        })?;
    Ok(())
}

async fn create_table(conn: &mut PgConnection) -> Result<(), SmokeError> {
    tracing::info!(schema = SCHEMA_NAME, table = "customer", "Creating table");
    sqlx::query(CREATE_TABLE_SQL)
        .execute(&mut *conn)
        .await
        .map_err(|source| SmokeError::Query {
            statement: CREATE_TABLE_SQL,
            source,
        })?;
    Ok(())
}

/// Map binding credentials onto postgres connect options.
fn connect_options(credentials: &ServiceCredentials) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&credentials.hostname)
        .port(credentials.port)
        .username(&credentials.username)
        .password(&credentials.password)
        .database(&credentials.name)
        .ssl_mode(ssl_mode(credentials.use_tls))
}

/// The binding carries a boolean TLS flag; postgres wants an ssl mode.
fn ssl_mode(use_tls: bool) -> PgSslMode {
    if use_tls {
        PgSslMode::Require
    } else {
        PgSslMode::Disable
    }
}
