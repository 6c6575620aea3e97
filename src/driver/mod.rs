//! Database Driver Traits and Core Types
//!
//! This module defines the narrow interface the connection manager uses to
//! talk to a database. The real PostgreSQL implementation lives in
//! [`postgres`]; tests substitute in-memory fakes, so manager and resolver
//! logic never needs a live server.
//!
//! # Session Model
//! Connections follow the classic DB-API session model: a transaction is
//! opened implicitly before the first statement, and `commit`/`rollback`
//! end it. The manager's scoped helpers drive those calls; the driver
//! never commits on its own.

use std::collections::HashMap;

use crate::config::Credentials;
use crate::error::Result;

pub mod postgres;

/// A result row: column name mapped to a JSON-safe value
pub type Row = HashMap<String, serde_json::Value>;

/// Positional SQL parameter value
///
/// Parameters are always passed through driver parameterization; they are
/// never interpolated into query text.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T> From<Option<T>> for SqlValue
where
    T: Into<SqlValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Capability for opening database connections from resolved credentials
pub trait DatabaseDriver {
    /// Open a connection using the given credentials
    ///
    /// Fails with [`crate::error::ConnectorError::Connection`] wrapping the
    /// underlying driver failure (network, auth, TLS negotiation).
    fn open(&self, credentials: &Credentials) -> Result<Box<dyn DriverConnection>>;
}

/// An open database session
pub trait DriverConnection {
    /// Execute a statement, returning the number of rows affected
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64>;

    /// Execute a statement and collect its result rows
    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>>;

    /// Commit the current transaction, if one is open
    fn commit(&mut self) -> Result<()>;

    /// Roll back the current transaction, if one is open
    fn rollback(&mut self) -> Result<()>;

    /// Close the session
    fn close(self: Box<Self>) -> Result<()>;
}
