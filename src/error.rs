//! Error Handling Infrastructure
//!
//! This module defines all error types used throughout pgconnect.
//! The three kinds are deliberately kept distinguishable so callers can
//! branch on them (e.g. retry only connection failures).
//!
//! # Error Categories
//! - `Configuration`: credential source missing, unreadable, malformed, or incomplete
//! - `Connection`: failure to establish or use the database connection
//! - `Vault`: failure specific to the secrets-service step (auth, path, transport)

use thiserror::Error;

/// Main error type for pgconnect operations
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// Credential source missing, unreadable, malformed, or incomplete.
    /// The message always names the offending field(s) or file path.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Database connection or driver-level query failure
    #[error("Connection error: {0}")]
    Connection(String),

    /// Secrets-service failure: authentication rejected, path not found,
    /// or service unreachable
    #[error("Vault error: {0}")]
    Vault(String),
}

impl ConnectorError {
    /// Convert error to a stable code string suitable for programmatic handling
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Connection(_) => "CONNECTION_ERROR",
            Self::Vault(_) => "VAULT_ERROR",
        }
    }

    /// Get the human-readable error message
    ///
    /// Messages never contain credentials; they may name fields, paths,
    /// or the underlying driver error text.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Whether a caller-side retry is a sensible response.
    ///
    /// Only connection failures are considered transient; configuration and
    /// vault failures will not fix themselves on retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a vault error
    pub fn vault(message: impl Into<String>) -> Self {
        Self::Vault(message.into())
    }
}

/// Result type alias for pgconnect operations
pub type Result<T> = std::result::Result<T, ConnectorError>;
