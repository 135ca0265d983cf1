//! LDAPS connection handling.
//!
//! ## Security Requirements
//!
//! All connections use LDAPS (TLS from connection start).
//! STARTTLS is NOT supported to prevent downgrade attacks.
//!
//! One synchronous connection per gateway; no pooling, no reconnection.

use ldap3::{LdapConn, LdapConnSettings};

use crate::config::LdapConfig;
use crate::error::{LdapError, LdapResult};

/// A single blocking LDAPS connection.
pub struct LdapConnection {
    conn: LdapConn,
    config: LdapConfig,
}

impl LdapConnection {
    /// Opens a connection to the configured server.
    ///
    /// ## Security
    ///
    /// The configuration is re-validated, so a hand-built `LdapConfig` with
    /// a plain `ldap://` URL is still refused.
    pub fn open(config: LdapConfig) -> LdapResult<Self> {
        config.validate()?;

        let settings = LdapConnSettings::new()
            .set_conn_timeout(config.connection_timeout)
            .set_no_tls_verify(!config.validate_certificates);

        if !config.validate_certificates {
            tracing::warn!(url = %config.connection_url, "certificate validation disabled");
        }

        let conn = LdapConn::with_settings(settings, &config.connection_url)
            .map_err(|e| LdapError::from_ldap3(e, &config.connection_url))?;

        tracing::debug!(url = %config.connection_url, "LDAPS connection established");
        Ok(Self { conn, config })
    }

    /// Returns the connection with the operation timeout armed.
    ///
    /// ldap3 clears the timeout after each operation, so it is set again
    /// before every call.
    pub fn ldap(&mut self) -> &mut LdapConn {
        self.conn.with_timeout(self.config.operation_timeout)
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &LdapConfig {
        &self.config
    }

    /// Closes the connection.
    pub fn close(mut self) {
        if let Err(e) = self.conn.unbind() {
            tracing::debug!(error = %e, "unbind failed");
        }
    }
}

impl std::fmt::Debug for LdapConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapConnection")
            .field("url", &self.config.connection_url)
            .finish_non_exhaustive()
    }
}
