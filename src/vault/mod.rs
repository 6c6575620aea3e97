//! Secrets-Service Client (HashiCorp Vault KV v2)
//!
//! This module defines the capability the credential resolver consumes when
//! running in production: authenticate against a secrets service, then read
//! a key-value payload at a secret path. The protocol itself lives behind
//! the [`SecretsBackend`] trait so resolver logic can be tested with
//! in-memory fakes (no network needed).
//!
//! # Implementation Notes
//! - [`HttpVaultClient`] talks to Vault's KV v2 engine over blocking HTTP
//! - Authentication is verified via `GET /v1/auth/token/lookup-self`
//! - Secrets are read via `GET /v1/{mount}/data/{rest}`
//! - Payload values are coerced to strings (Vault stores ports as numbers
//!   as often as strings)
//! - Tokens are never logged and never appear in error messages

use std::collections::HashMap;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use tracing::debug;

use crate::error::{ConnectorError, Result};

/// An authenticated session against a secrets service.
///
/// Opaque to callers; the backend that issued it knows how to use it.
#[derive(Clone)]
pub struct VaultSession {
    address: String,
    token: String,
}

impl VaultSession {
    /// Create a session from an address and token.
    ///
    /// Exposed so fake backends in tests can mint sessions directly.
    #[must_use]
    pub fn new(address: impl Into<String>, token: impl Into<String>) -> Self {
        Self { address: address.into(), token: token.into() }
    }

    /// Service address this session authenticated against
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl std::fmt::Debug for VaultSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultSession")
            .field("address", &self.address)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Capability for reading credentials from a secrets service.
///
/// The resolver only consumes this interface; it never implements the
/// secrets protocol itself.
pub trait SecretsBackend {
    /// Authenticate against the service at `address` using `token`
    ///
    /// Fails with [`ConnectorError::Vault`] if the service is unreachable
    /// or the token is rejected.
    fn authenticate(&self, address: &str, token: &str) -> Result<VaultSession>;

    /// Read the key-value payload stored at `path`
    ///
    /// Fails with [`ConnectorError::Vault`] if the path does not exist,
    /// access is denied, or the service is unreachable.
    fn read_secret(&self, session: &VaultSession, path: &str) -> Result<HashMap<String, String>>;
}

/// Blocking HTTP client for HashiCorp Vault's KV v2 engine
pub struct HttpVaultClient {
    http: Client,
}

impl HttpVaultClient {
    /// Create a client with default HTTP settings
    #[must_use]
    pub fn new() -> Self {
        Self { http: Client::new() }
    }
}

impl Default for HttpVaultClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretsBackend for HttpVaultClient {
    fn authenticate(&self, address: &str, token: &str) -> Result<VaultSession> {
        let url = format!("{}/v1/auth/token/lookup-self", address.trim_end_matches('/'));

        let response = self
            .http
            .get(&url)
            .header("X-Vault-Token", token)
            .send()
            .map_err(|e| ConnectorError::vault(format!("Vault unreachable at {address}: {e}")))?;

        match response.status() {
            status if status.is_success() => {
                debug!(address, "authenticated with vault");
                Ok(VaultSession::new(address, token))
            }
            StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => {
                Err(ConnectorError::vault("Failed to authenticate with Vault: token rejected"))
            }
            status => Err(ConnectorError::vault(format!(
                "Vault authentication check returned status {status}"
            ))),
        }
    }

    fn read_secret(&self, session: &VaultSession, path: &str) -> Result<HashMap<String, String>> {
        let url = kv2_url(&session.address, path)?;

        let response = self
            .http
            .get(&url)
            .header("X-Vault-Token", &session.token)
            .send()
            .map_err(|e| {
                ConnectorError::vault(format!("Vault unreachable at {}: {e}", session.address))
            })?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(ConnectorError::vault(format!("Secret path not found: {path}")))
            }
            StatusCode::FORBIDDEN => {
                return Err(ConnectorError::vault(format!("Access denied for secret path: {path}")))
            }
            status => {
                return Err(ConnectorError::vault(format!(
                    "Vault read of '{path}' returned status {status}"
                )))
            }
        }

        let body: serde_json::Value = response
            .json()
            .map_err(|e| ConnectorError::vault(format!("Invalid Vault response body: {e}")))?;

        // KV v2 nests the payload under data.data
        let payload = body
            .get("data")
            .and_then(|d| d.get("data"))
            .and_then(serde_json::Value::as_object)
            .ok_or_else(|| {
                ConnectorError::vault(format!("Unexpected Vault payload shape at '{path}'"))
            })?;

        let mut secrets = HashMap::with_capacity(payload.len());
        for (key, value) in payload {
            if let Some(text) = value_to_string(value) {
                secrets.insert(key.clone(), text);
            }
        }

        debug!(path, keys = secrets.len(), "read secret from vault");
        Ok(secrets)
    }
}

/// Build the KV v2 read URL for a secret path.
///
/// The first path segment is the mount point; KV v2 inserts `data` between
/// the mount and the rest: `secret/database/postgresql` becomes
/// `{addr}/v1/secret/data/database/postgresql`.
fn kv2_url(address: &str, path: &str) -> Result<String> {
    let trimmed = path.trim_matches('/');
    let (mount, rest) = trimmed.split_once('/').ok_or_else(|| {
        ConnectorError::vault(format!(
            "Secret path '{path}' must include a mount point and a key path"
        ))
    })?;

    Ok(format!("{}/v1/{mount}/data/{rest}", address.trim_end_matches('/')))
}

/// Coerce a JSON payload value to its string form.
///
/// Nulls are dropped; numbers and booleans are stringified; nested
/// structures keep their JSON text representation.
fn value_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}
