//! PostgreSQL Driver Implementation
//!
//! Implements the driver traits over the blocking `postgres` crate.
//!
//! # Implementation Notes
//! - TLS via `postgres-native-tls`, so `ssl_mode = require` actually
//!   negotiates TLS instead of being silently ignored
//! - A transaction is opened lazily before the first statement and ended by
//!   `commit`/`rollback`, matching the DB-API session model the manager's
//!   scoped helpers assume
//! - Row values are converted to JSON: BYTEA is Base64-encoded, timestamps
//!   become ISO 8601 strings, JSON/JSONB is preserved as nested JSON
//! - Connection errors are not logged with credentials attached

use bytes::BytesMut;
use postgres::config::SslMode;
use postgres::types::{to_sql_checked, IsNull, ToSql, Type};
use postgres::{Client, Config, Row as PgRow};
use postgres_native_tls::MakeTlsConnector;
use std::time::Duration;

use crate::config::Credentials;
use crate::driver::{DatabaseDriver, DriverConnection, Row, SqlValue};
use crate::error::{ConnectorError, Result};

/// Connect timeout applied to every connection attempt
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// PostgreSQL driver (blocking)
pub struct PostgresDriver;

impl PostgresDriver {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for PostgresDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseDriver for PostgresDriver {
    fn open(&self, credentials: &Credentials) -> Result<Box<dyn DriverConnection>> {
        let config = build_pg_config(credentials)?;

        let tls = native_tls::TlsConnector::builder().build().map_err(|e| {
            ConnectorError::connection(format!("Failed to initialize TLS connector: {e}"))
        })?;
        let connector = MakeTlsConnector::new(tls);

        let mut client = config.connect(connector).map_err(|e| {
            ConnectorError::connection(format!("Failed to connect to PostgreSQL: {e}"))
        })?;

        // Probe the session so a dead-on-arrival connection fails here,
        // not on the first caller query.
        client
            .simple_query("SELECT 1")
            .map_err(|e| ConnectorError::connection(format!("Connection probe failed: {e}")))?;

        Ok(Box::new(PostgresConnection { client, in_transaction: false }))
    }
}

/// Build a `postgres` crate config from resolved credentials
fn build_pg_config(credentials: &Credentials) -> Result<Config> {
    let mut config = Config::new();
    config
        .host(&credentials.host)
        .port(credentials.port)
        .dbname(&credentials.database)
        .user(&credentials.username)
        .password(&credentials.password)
        .ssl_mode(parse_ssl_mode(&credentials.ssl_mode)?)
        .connect_timeout(CONNECT_TIMEOUT);

    Ok(config)
}

/// Map an `ssl_mode` string to the driver's setting
fn parse_ssl_mode(value: &str) -> Result<SslMode> {
    match value.to_ascii_lowercase().as_str() {
        "disable" => Ok(SslMode::Disable),
        "allow" | "prefer" => Ok(SslMode::Prefer),
        "require" | "verify-ca" | "verify-full" => Ok(SslMode::Require),
        other => Err(ConnectorError::configuration(format!("Unsupported ssl_mode: '{other}'"))),
    }
}

/// An open PostgreSQL session with lazy transaction handling
struct PostgresConnection {
    client: Client,
    in_transaction: bool,
}

impl PostgresConnection {
    /// Open a transaction before the first statement of a unit of work
    fn ensure_transaction(&mut self) -> Result<()> {
        if !self.in_transaction {
            self.client.batch_execute("BEGIN").map_err(|e| {
                ConnectorError::connection(format!("Failed to begin transaction: {e}"))
            })?;
            self.in_transaction = true;
        }
        Ok(())
    }
}

impl DriverConnection for PostgresConnection {
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        self.ensure_transaction()?;

        let bound: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        self.client
            .execute(sql, &bound)
            .map_err(|e| ConnectorError::connection(format!("Failed to execute statement: {e}")))
    }

    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        self.ensure_transaction()?;

        let bound: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        let rows = self
            .client
            .query(sql, &bound)
            .map_err(|e| ConnectorError::connection(format!("Failed to execute query: {e}")))?;

        rows.iter().map(row_to_map).collect()
    }

    fn commit(&mut self) -> Result<()> {
        if self.in_transaction {
            self.client.batch_execute("COMMIT").map_err(|e| {
                ConnectorError::connection(format!("Failed to commit transaction: {e}"))
            })?;
            self.in_transaction = false;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        if self.in_transaction {
            self.client.batch_execute("ROLLBACK").map_err(|e| {
                ConnectorError::connection(format!("Failed to roll back transaction: {e}"))
            })?;
            self.in_transaction = false;
        }
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.client
            .close()
            .map_err(|e| ConnectorError::connection(format!("Failed to close connection: {e}")))
    }
}

impl ToSql for SqlValue {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> std::result::Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            Self::Null => Ok(IsNull::Yes),
            Self::Bool(v) => v.to_sql(ty, out),
            Self::Int(v) => match *ty {
                Type::INT2 => i16::try_from(*v)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            Self::Float(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            Self::Text(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        // Dynamic values resolve their wire format per target type above.
        true
    }

    to_sql_checked!();
}

/// Convert a PostgreSQL row into a column-name -> JSON value map
fn row_to_map(row: &PgRow) -> Result<Row> {
    let mut map = Row::with_capacity(row.len());
    for idx in 0..row.len() {
        let name = row.columns()[idx].name().to_string();
        map.insert(name, pg_value_to_json(row, idx)?);
    }
    Ok(map)
}

/// Convert a single PostgreSQL value to JSON
fn pg_value_to_json(row: &PgRow, idx: usize) -> Result<serde_json::Value> {
    use serde_json::Value;

    let col_type = row.columns()[idx].type_();

    let value = match *col_type {
        Type::BOOL => opt(row, idx)?.map_or(Value::Null, Value::Bool),

        Type::INT2 => opt::<i16>(row, idx)?.map_or(Value::Null, |v| Value::Number(v.into())),
        Type::INT4 => opt::<i32>(row, idx)?.map_or(Value::Null, |v| Value::Number(v.into())),
        Type::INT8 => opt::<i64>(row, idx)?.map_or(Value::Null, |v| Value::Number(v.into())),

        // NaN/Infinity have no JSON representation and become null
        Type::FLOAT4 => opt::<f32>(row, idx)?
            .and_then(|v| serde_json::Number::from_f64(f64::from(v)))
            .map_or(Value::Null, Value::Number),
        Type::FLOAT8 => opt::<f64>(row, idx)?
            .and_then(serde_json::Number::from_f64)
            .map_or(Value::Null, Value::Number),

        Type::VARCHAR | Type::TEXT | Type::BPCHAR | Type::NAME => {
            opt::<String>(row, idx)?.map_or(Value::Null, Value::String)
        }

        Type::JSON | Type::JSONB => opt::<Value>(row, idx)?.unwrap_or(Value::Null),

        Type::BYTEA => opt::<Vec<u8>>(row, idx)?.map_or(Value::Null, |v| {
            use base64::Engine;
            Value::String(base64::engine::general_purpose::STANDARD.encode(v))
        }),

        Type::TIMESTAMP => opt::<chrono::NaiveDateTime>(row, idx)?
            .map_or(Value::Null, |v| Value::String(v.format("%Y-%m-%dT%H:%M:%S").to_string())),
        Type::TIMESTAMPTZ => opt::<chrono::DateTime<chrono::Utc>>(row, idx)?
            .map_or(Value::Null, |v| Value::String(v.to_rfc3339())),
        Type::DATE => opt::<chrono::NaiveDate>(row, idx)?
            .map_or(Value::Null, |v| Value::String(v.format("%Y-%m-%d").to_string())),
        Type::TIME => opt::<chrono::NaiveTime>(row, idx)?
            .map_or(Value::Null, |v| Value::String(v.format("%H:%M:%S").to_string())),

        Type::UUID => {
            opt::<uuid::Uuid>(row, idx)?.map_or(Value::Null, |v| Value::String(v.to_string()))
        }

        // Default: try to get as string
        _ => opt::<String>(row, idx)
            .map_err(|_| {
                ConnectorError::connection(format!(
                    "Cannot convert PostgreSQL type '{}' to JSON",
                    col_type.name()
                ))
            })?
            .map_or(Value::Null, Value::String),
    };

    Ok(value)
}

/// Fetch a nullable column value
fn opt<'a, T: postgres::types::FromSql<'a>>(row: &'a PgRow, idx: usize) -> Result<Option<T>> {
    row.try_get::<_, Option<T>>(idx)
        .map_err(|e| ConnectorError::connection(format!("Failed to read column value: {e}")))
}
