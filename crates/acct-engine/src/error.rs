//! Account engine error types.
//!
//! Every distinct failure cause is its own variant so callers can tell a
//! refused bind from a malformed uid from a half-finished rename without
//! parsing messages.

use std::fmt;

use acct_gateway::GatewayError;
use acct_model::ModelError;
use thiserror::Error;

use crate::rename::{RedirectInterrupted, RenameInterrupted};

/// Input that failed a validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationField {
    /// Short account identifier.
    Uid,
    /// Full name.
    FullName,
    /// Email address.
    Email,
}

impl fmt::Display for ValidationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uid => "uid",
            Self::FullName => "full name",
            Self::Email => "email",
        })
    }
}

/// Failure of the uid allocator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// No free uid exists at or above the threshold within the bound.
    #[error("no free uid between {minimum} and {maximum}")]
    Exhausted {
        /// Lowest acceptable uid.
        minimum: u32,
        /// Highest acceptable uid.
        maximum: u32,
    },
}

/// Errors returned by account manager operations.
#[derive(Debug, Error)]
pub enum AccountError {
    /// The directory could not be reached or refused the session.
    #[error("connection failed: {0}")]
    Connection(#[source] GatewayError),

    /// Input rejected before any directory mutation.
    #[error("invalid {field}: {message}")]
    Validation {
        /// Offending input.
        field: ValidationField,
        /// What was wrong with it.
        message: String,
    },

    /// The session lacks the right to perform the operation.
    #[error("permission denied: {0}")]
    Permission(String),

    /// The directory's shape violates an expected invariant.
    #[error("directory consistency check failed: {0}")]
    Consistency(String),

    /// A rename stopped after mutating the directory.
    #[error("{0}")]
    PartialMutation(Box<RenameInterrupted>),

    /// A standalone reference sweep stopped after mutating the directory.
    #[error("{0}")]
    PartialRedirect(Box<RedirectInterrupted>),

    /// No uid could be allocated.
    #[error("uid allocation failed: {0}")]
    Allocation(#[from] AllocationError),

    /// The directory refused a single operation.
    #[error("directory rejected the operation: {0}")]
    Directory(#[source] GatewayError),

    /// Local failure unrelated to the directory.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AccountError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(field: ValidationField, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Creates a permission error.
    #[must_use]
    pub fn permission(msg: impl Into<String>) -> Self {
        Self::Permission(msg.into())
    }

    /// Creates a consistency error.
    #[must_use]
    pub fn consistency(msg: impl Into<String>) -> Self {
        Self::Consistency(msg.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Checks if this is a connection-kind error.
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Checks if this is a validation error.
    #[must_use]
    pub const fn is_validation_error(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Checks if this is a partial-mutation error of a rename or of a
    /// standalone sweep.
    #[must_use]
    pub const fn is_partial_mutation(&self) -> bool {
        matches!(self, Self::PartialMutation(_) | Self::PartialRedirect(_))
    }

    /// Returns the rename progress record of a partial-mutation error.
    #[must_use]
    pub fn interrupted(&self) -> Option<&RenameInterrupted> {
        match self {
            Self::PartialMutation(progress) => Some(progress),
            _ => None,
        }
    }

    /// Returns the sweep progress record of a partial-redirect error.
    #[must_use]
    pub fn redirect_interrupted(&self) -> Option<&RedirectInterrupted> {
        match self {
            Self::PartialRedirect(progress) => Some(progress),
            _ => None,
        }
    }
}

impl From<GatewayError> for AccountError {
    fn from(err: GatewayError) -> Self {
        if err.is_connection_error() {
            Self::Connection(err)
        } else {
            Self::Directory(err)
        }
    }
}

impl From<ModelError> for AccountError {
    fn from(err: ModelError) -> Self {
        Self::Consistency(err.to_string())
    }
}

impl From<RenameInterrupted> for AccountError {
    fn from(progress: RenameInterrupted) -> Self {
        Self::PartialMutation(Box::new(progress))
    }
}

impl From<RedirectInterrupted> for AccountError {
    fn from(progress: RedirectInterrupted) -> Self {
        Self::PartialRedirect(Box::new(progress))
    }
}

/// Result type for account operations.
pub type AccountResult<T> = Result<T, AccountError>;
