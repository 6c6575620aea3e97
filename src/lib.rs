//! pgconnect - Environment-Aware PostgreSQL Connection Management
//!
//! pgconnect resolves database credentials from the right place for the
//! runtime environment, then hands back a managed connection with a small
//! execute/transaction surface.
//!
//! # Core Behavior
//! - Local/dev environments read credentials from a properties file
//! - Production reads them from HashiCorp Vault (KV v2)
//! - Environment detection: explicit argument > `ENVIRONMENT` variable >
//!   presence inference (`VAULT_ADDR`/`AWS_REGION`) > default local
//! - One connection per manager; connect/disconnect are idempotent
//! - Queries run in scoped transactions: commit on success, rollback on
//!   failure, original errors never masked by cleanup
//! - Three distinguishable error kinds (configuration, connection, vault)
//!   so callers can branch (e.g. retry only connection failures)
//!
//! # What pgconnect Is Not
//! Not a pool, not a query builder, not an ORM, not a migration tool.
//! Concurrent use of one manager must be serialized by the caller.
//!
//! # Module Organization
//! - [`error`] - Error types and handling
//! - [`config`] - Environment detection and credential resolution
//! - [`vault`] - Secrets-service client (trait + Vault KV v2 implementation)
//! - [`driver`] - Database driver traits and the PostgreSQL implementation
//! - [`connection`] - Connection lifecycle and query execution
//!
//! # Example
//! ```no_run
//! use pgconnect::{ConnectionManager, FetchMode};
//!
//! let mut manager = ConnectionManager::new();
//! let output = manager.execute_query("SELECT version()", &[], FetchMode::One)?;
//! if let Some(row) = output.into_row() {
//!     println!("{}", row["version"]);
//! }
//! manager.disconnect();
//! # Ok::<(), pgconnect::ConnectorError>(())
//! ```

pub mod config;
pub mod connection;
pub mod driver;
pub mod error;
pub mod vault;

// Re-export commonly used types for convenience
pub use config::{
    detect_environment, validate_credentials, ConfigResolver, Credentials, Environment,
    ResolverOptions,
};
pub use connection::{ConnectionInfo, ConnectionManager, FetchMode, QueryOutput};
pub use driver::{postgres::PostgresDriver, DatabaseDriver, DriverConnection, Row, SqlValue};
pub use error::{ConnectorError, Result};
pub use vault::{HttpVaultClient, SecretsBackend, VaultSession};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_exports() {
        // Verify that key types are accessible through the crate root
        let _env = Environment::Local;
        let _mode = FetchMode::All;
        let _err = ConnectorError::connection("test");
        let _opts = ResolverOptions::default();
    }
}
