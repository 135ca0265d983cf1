//! LDAP-specific error types.
//!
//! ## Security Note
//!
//! Error messages must not leak sensitive information like
//! passwords or bind credentials.

use acct_gateway::GatewayError;
use thiserror::Error;

/// LDAP result codes the gateway distinguishes.
pub mod rc {
    /// The operation succeeded.
    pub const SUCCESS: u32 = 0;
    /// Attribute or value does not exist.
    pub const NO_SUCH_ATTRIBUTE: u32 = 16;
    /// Attribute or value already exists.
    pub const ATTRIBUTE_OR_VALUE_EXISTS: u32 = 20;
    /// The target entry does not exist.
    pub const NO_SUCH_OBJECT: u32 = 32;
    /// Bind refused.
    pub const INVALID_CREDENTIALS: u32 = 49;
    /// The bound identity lacks rights.
    pub const INSUFFICIENT_ACCESS: u32 = 50;
    /// The server is busy.
    pub const BUSY: u32 = 51;
    /// The server is unavailable.
    pub const UNAVAILABLE: u32 = 52;
    /// The entry already exists.
    pub const ENTRY_ALREADY_EXISTS: u32 = 68;
}

/// LDAP-specific errors.
#[derive(Debug, Error)]
pub enum LdapError {
    /// Invalid configuration.
    #[error("LDAP configuration error: {0}")]
    Configuration(String),

    /// Connection URL must use LDAPS.
    #[error("Security error: Only LDAPS is supported. URL must start with 'ldaps://'. STARTTLS and plain LDAP are not allowed.")]
    InsecureProtocol,

    /// Connection failed.
    #[error("LDAP connection failed: {0}")]
    Connection(String),

    /// Timeout error.
    #[error("LDAP operation timed out")]
    Timeout,

    /// The server answered with a non-success result code.
    #[error("LDAP result {code} for {target}: {text}")]
    Result {
        /// LDAP result code.
        code: u32,
        /// DN the operation targeted.
        target: String,
        /// Diagnostic text from the server.
        text: String,
    },

    /// Underlying ldap3 error.
    #[error("LDAP error: {0}")]
    Ldap3(#[from] ldap3::LdapError),
}

impl LdapError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Classifies an ldap3 error raised by an operation on `target`.
    #[must_use]
    pub fn from_ldap3(err: ldap3::LdapError, target: &str) -> Self {
        match err {
            ldap3::LdapError::LdapResult { result } => Self::Result {
                code: result.rc,
                target: target.to_string(),
                text: result.text,
            },
            ldap3::LdapError::Timeout { .. } => Self::Timeout,
            ldap3::LdapError::Io { source } => Self::Connection(source.to_string()),
            other => Self::Ldap3(other),
        }
    }

    /// Checks if this is a connection-related error.
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection(_)
                | Self::Timeout
                | Self::Result {
                    code: rc::INVALID_CREDENTIALS | rc::BUSY | rc::UNAVAILABLE,
                    ..
                }
        )
    }

    /// Checks if this is a security-related error.
    #[must_use]
    pub const fn is_security_error(&self) -> bool {
        matches!(
            self,
            Self::InsecureProtocol
                | Self::Result {
                    code: rc::INVALID_CREDENTIALS | rc::INSUFFICIENT_ACCESS,
                    ..
                }
        )
    }
}

/// Result type for LDAP operations.
pub type LdapResult<T> = Result<T, LdapError>;

impl From<LdapError> for GatewayError {
    fn from(err: LdapError) -> Self {
        match err {
            LdapError::Configuration(msg) => GatewayError::Connection(msg),
            LdapError::InsecureProtocol => GatewayError::Connection(err.to_string()),
            LdapError::Connection(msg) => GatewayError::Connection(msg),
            LdapError::Timeout => GatewayError::timeout("LDAP operation"),
            LdapError::Result { code, target, text } => match code {
                rc::INVALID_CREDENTIALS => GatewayError::InvalidCredentials(target),
                rc::NO_SUCH_OBJECT => GatewayError::NoSuchObject(target),
                rc::ENTRY_ALREADY_EXISTS => GatewayError::AlreadyExists(target),
                rc::INSUFFICIENT_ACCESS => GatewayError::InsufficientAccess(target),
                rc::BUSY | rc::UNAVAILABLE => {
                    GatewayError::Connection(format!("server unavailable ({code}): {text}"))
                }
                _ => GatewayError::Protocol(format!("result {code} for {target}: {text}")),
            },
            LdapError::Ldap3(e) => GatewayError::Protocol(e.to_string()),
        }
    }
}
