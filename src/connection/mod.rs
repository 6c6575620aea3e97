//! Connection Lifecycle and Query Execution
//!
//! [`ConnectionManager`] owns exactly one driver connection and the
//! resolver that produced its credentials. It is not a pool: callers who
//! need concurrency layer their own pool or mutex over manager instances,
//! and all calls block until the driver returns.
//!
//! # Transaction Discipline
//! Every query helper runs inside [`ConnectionManager::with_cursor`], the
//! scoped-acquisition primitive: commit on success (when requested),
//! rollback on failure, and the original error always propagates unmasked.
//! A failed statement therefore never leaves the session stuck in an
//! aborted transaction.
//!
//! # Retries
//! No operation retries internally. Callers that want retry catch errors
//! where [`ConnectorError::is_retryable`] is true and re-invoke with their
//! own backoff.

use serde::Serialize;
use tracing::{error, info};

use crate::config::{ConfigResolver, Environment};
use crate::driver::postgres::PostgresDriver;
use crate::driver::{DatabaseDriver, DriverConnection, Row, SqlValue};
use crate::error::{ConnectorError, Result};

/// How much of a result set to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Return the first row, if any
    One,
    /// Return every row, in result order
    All,
    /// Discard any result set (DDL/DML)
    None,
}

/// Result of [`ConnectionManager::execute_query`], shaped by the fetch mode
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    /// `FetchMode::One`: the first row, or `None` for an empty result
    Row(Option<Row>),
    /// `FetchMode::All`: every row, in result order
    Rows(Vec<Row>),
    /// `FetchMode::None`: rows affected
    Affected(u64),
}

impl QueryOutput {
    /// Unwrap a single-row result
    #[must_use]
    pub fn into_row(self) -> Option<Row> {
        match self {
            Self::Row(row) => row,
            Self::Rows(mut rows) => {
                if rows.is_empty() {
                    None
                } else {
                    Some(rows.remove(0))
                }
            }
            Self::Affected(_) => None,
        }
    }

    /// Unwrap a multi-row result
    #[must_use]
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Self::Rows(rows) => rows,
            Self::Row(row) => row.into_iter().collect(),
            Self::Affected(_) => Vec::new(),
        }
    }
}

/// Non-sensitive connection details, safe to log or serialize
///
/// This is a redaction contract: the password (and anything derived from
/// the SSL settings) never appears here.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionInfo {
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub connected: bool,
}

/// PostgreSQL connection manager with environment-aware credential handling
///
/// Owns one underlying connection. Not internally synchronized: concurrent
/// use from multiple threads must be serialized by the caller.
pub struct ConnectionManager {
    resolver: ConfigResolver,
    driver: Box<dyn DatabaseDriver>,
    connection: Option<Box<dyn DriverConnection>>,
}

impl ConnectionManager {
    /// Create a manager resolving everything from process environment
    #[must_use]
    pub fn new() -> Self {
        Self::with_resolver(ConfigResolver::from_env())
    }

    /// Create a manager around a pre-built resolver
    #[must_use]
    pub fn with_resolver(resolver: ConfigResolver) -> Self {
        Self::with_driver(resolver, Box::new(PostgresDriver::new()))
    }

    /// Create a manager with an injected driver (used by tests)
    #[must_use]
    pub fn with_driver(resolver: ConfigResolver, driver: Box<dyn DatabaseDriver>) -> Self {
        Self { resolver, driver, connection: None }
    }

    /// Establish the connection if not already connected
    ///
    /// Idempotent: calling while connected is a no-op. Credential
    /// resolution and validation failures surface unchanged
    /// (`Configuration`/`Vault`); driver failures surface as `Connection`.
    pub fn connect(&mut self) -> Result<()> {
        self.ensure_connected().map(|_| ())
    }

    /// Close the connection if one is open
    ///
    /// Idempotent and infallible: close failures are logged, not raised.
    pub fn disconnect(&mut self) {
        if let Some(connection) = self.connection.take() {
            if let Err(e) = connection.close() {
                error!(error = %e, "error while closing connection");
            } else {
                info!("PostgreSQL connection closed");
            }
        }
    }

    /// Whether a connection handle is currently held.
    ///
    /// A local state check only: no I/O is performed, and a connection
    /// dropped by the server is not detected here.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// The environment the underlying resolver detected
    #[must_use]
    pub const fn environment(&self) -> Environment {
        self.resolver.environment()
    }

    /// Execute a statement with positional parameters, auto-connecting first
    ///
    /// Runs in its own transaction: committed on success, rolled back on
    /// failure before the error propagates.
    pub fn execute_query(
        &mut self,
        sql: &str,
        params: &[SqlValue],
        fetch: FetchMode,
    ) -> Result<QueryOutput> {
        self.with_cursor(true, |conn| match fetch {
            FetchMode::One => {
                let mut rows = conn.query(sql, params)?;
                let first = if rows.is_empty() { None } else { Some(rows.remove(0)) };
                Ok(QueryOutput::Row(first))
            }
            FetchMode::All => Ok(QueryOutput::Rows(conn.query(sql, params)?)),
            FetchMode::None => Ok(QueryOutput::Affected(conn.execute(sql, params)?)),
        })
    }

    /// Execute the same statement once per parameter batch, all-or-nothing
    ///
    /// One transaction covers the whole sequence: committed only after
    /// every batch succeeds, rolled back entirely on any failure. Returns
    /// the total number of rows affected.
    pub fn execute_many(&mut self, sql: &str, batches: &[Vec<SqlValue>]) -> Result<u64> {
        self.with_cursor(true, |conn| {
            let mut affected = 0;
            for params in batches {
                affected += conn.execute(sql, params)?;
            }
            Ok(affected)
        })
    }

    /// Scoped acquisition of the connection with transaction handling
    ///
    /// On `Ok`, commits when `commit` is true. On `Err`, rolls back and
    /// re-raises the original error; rollback failures never mask it.
    pub fn with_cursor<T, F>(&mut self, commit: bool, work: F) -> Result<T>
    where
        F: FnOnce(&mut dyn DriverConnection) -> Result<T>,
    {
        let connection = self.ensure_connected()?;

        match work(connection.as_mut()) {
            Ok(value) => {
                if commit {
                    connection.commit()?;
                }
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = connection.rollback() {
                    error!(error = %rollback_err, "rollback failed after query error");
                }
                Err(err)
            }
        }
    }

    /// Scoped acquisition without automatic commit
    ///
    /// The caller drives `commit` itself; a propagating error still rolls
    /// back, and the connection stays open for reuse.
    pub fn with_connection<T, F>(&mut self, work: F) -> Result<T>
    where
        F: FnOnce(&mut dyn DriverConnection) -> Result<T>,
    {
        self.with_cursor(false, work)
    }

    /// Non-sensitive connection details: environment, host, port, database,
    /// username, and the connected flag. Never the password.
    ///
    /// Triggers credential resolution if it has not happened yet.
    pub fn connection_info(&mut self) -> Result<ConnectionInfo> {
        let credentials = self.resolver.get_credentials()?;
        Ok(ConnectionInfo {
            environment: self.resolver.environment(),
            host: credentials.host,
            port: credentials.port,
            database: credentials.database,
            username: credentials.username,
            connected: self.is_connected(),
        })
    }

    /// Resolve credentials and open the connection on first use
    fn ensure_connected(&mut self) -> Result<&mut Box<dyn DriverConnection>> {
        if self.connection.is_none() {
            let credentials = self.resolver.get_credentials()?;
            let connection = self.driver.open(&credentials)?;
            info!(
                host = %credentials.host,
                port = credentials.port,
                database = %credentials.database,
                environment = %self.resolver.environment(),
                "connected to PostgreSQL"
            );
            self.connection = Some(connection);
        }

        match self.connection.as_mut() {
            Some(connection) => Ok(connection),
            None => Err(ConnectorError::connection("connection was not established")),
        }
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.disconnect();
    }
}
