//! Gateway error types.
//!
//! ## Security Note
//!
//! Error messages must not carry bind credentials.

use thiserror::Error;

/// Errors returned by directory gateway primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Bind refused because the DN or secret is wrong.
    #[error("invalid credentials for {0}")]
    InvalidCredentials(String),

    /// The backend did not answer in time.
    #[error("directory operation timed out: {0}")]
    Timeout(String),

    /// The backend could not be reached or the connection dropped.
    #[error("directory connection error: {0}")]
    Connection(String),

    /// The operation named an entry that does not exist.
    #[error("no such entry: {0}")]
    NoSuchObject(String),

    /// An add or rename would create an entry that already exists.
    #[error("entry already exists: {0}")]
    AlreadyExists(String),

    /// An add-value modification named a value already present.
    #[error("{attribute} already holds {value} on {dn}")]
    ValueExists {
        /// Entry DN.
        dn: String,
        /// Attribute name.
        attribute: String,
        /// Value that was added.
        value: String,
    },

    /// A delete-value modification named a value that is not present.
    #[error("{attribute} does not hold {value} on {dn}")]
    NoSuchValue {
        /// Entry DN.
        dn: String,
        /// Attribute name.
        attribute: String,
        /// Value that was deleted.
        value: String,
    },

    /// The bound identity may not perform the operation.
    #[error("insufficient access rights: {0}")]
    InsufficientAccess(String),

    /// Any other protocol-level refusal.
    #[error("directory protocol error: {0}")]
    Protocol(String),
}

impl GatewayError {
    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a protocol error.
    #[must_use]
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout(operation.into())
    }

    /// Checks if this error concerns reaching or binding to the backend.
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials(_) | Self::Timeout(_) | Self::Connection(_)
        )
    }

    /// Checks if this is a bad-credentials error.
    #[must_use]
    pub const fn is_auth_error(&self) -> bool {
        matches!(self, Self::InvalidCredentials(_))
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
