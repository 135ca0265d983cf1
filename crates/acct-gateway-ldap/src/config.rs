//! LDAP gateway configuration.
//!
//! ## Security Requirements
//!
//! **CRITICAL**: Only LDAPS (LDAP over TLS) is supported.
//!
//! - Connection URLs MUST start with `ldaps://`
//! - STARTTLS is NOT supported (vulnerable to downgrade attacks)
//! - Plain `ldap://` is NOT supported (credentials transmitted in cleartext)
//!
//! Bind credentials are not part of this configuration. The account
//! manager binds with the operator's own identity after connecting.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LdapError, LdapResult};

/// Connection settings for an [`LdapGateway`](crate::LdapGateway).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LdapConfig {
    /// LDAP server URL (MUST be ldaps://).
    pub connection_url: String,

    /// Whether to validate server certificates.
    /// Should always be true in production.
    pub validate_certificates: bool,

    /// Timeout for establishing the connection.
    #[serde(with = "secs")]
    pub connection_timeout: Duration,

    /// Timeout applied to each directory operation.
    #[serde(with = "secs")]
    pub operation_timeout: Duration,
}

impl LdapConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> LdapConfigBuilder {
        LdapConfigBuilder::new()
    }

    /// Validates the configuration.
    ///
    /// ## Security
    ///
    /// This method enforces LDAPS-only connections.
    pub fn validate(&self) -> LdapResult<()> {
        validate_ldaps_url(&self.connection_url)?;

        if self.connection_timeout.is_zero() || self.operation_timeout.is_zero() {
            return Err(LdapError::config("timeouts must be non-zero"));
        }

        Ok(())
    }
}

/// Validates that a URL uses LDAPS.
///
/// ## Security
///
/// **CRITICAL**: Only `ldaps://` URLs are accepted.
fn validate_ldaps_url(url: &str) -> LdapResult<()> {
    if !url.to_lowercase().starts_with("ldaps://") {
        return Err(LdapError::InsecureProtocol);
    }

    // "ldaps://" is 8 chars
    if url.len() <= 8 {
        return Err(LdapError::config("Invalid LDAPS URL: missing host"));
    }

    Ok(())
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

// ============================================================================
// Configuration Builder
// ============================================================================

/// Builder for LDAP configuration.
#[derive(Debug)]
pub struct LdapConfigBuilder {
    connection_url: Option<String>,
    validate_certificates: bool,
    connection_timeout: Duration,
    operation_timeout: Duration,
}

impl Default for LdapConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LdapConfigBuilder {
    /// Creates a new builder with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connection_url: None,
            validate_certificates: true,
            connection_timeout: Duration::from_secs(5),
            operation_timeout: Duration::from_secs(30),
        }
    }

    /// Sets the connection URL (must be ldaps://).
    #[must_use]
    pub fn connection_url(mut self, url: impl Into<String>) -> Self {
        self.connection_url = Some(url.into());
        self
    }

    /// Sets whether to validate certificates.
    #[must_use]
    pub const fn validate_certificates(mut self, validate: bool) -> Self {
        self.validate_certificates = validate;
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Sets the per-operation timeout.
    #[must_use]
    pub const fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Builds and validates the configuration.
    ///
    /// ## Errors
    ///
    /// Returns an error if:
    /// - The connection URL is missing
    /// - Connection URL does not use LDAPS
    /// - A timeout is zero
    pub fn build(self) -> LdapResult<LdapConfig> {
        let config = LdapConfig {
            connection_url: self
                .connection_url
                .ok_or_else(|| LdapError::config("connection_url is required"))?,
            validate_certificates: self.validate_certificates,
            connection_timeout: self.connection_timeout,
            operation_timeout: self.operation_timeout,
        };

        config.validate()?;

        Ok(config)
    }
}
