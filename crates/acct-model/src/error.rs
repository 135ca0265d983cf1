//! Errors raised when a directory entry does not have the expected shape.

use thiserror::Error;

/// Result type for entry conversions.
pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// A directory entry could not be converted into a typed record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A required attribute is absent.
    #[error("entry {dn} is missing required attribute {attribute}")]
    MissingAttribute {
        /// Entry DN.
        dn: String,
        /// Attribute name.
        attribute: String,
    },

    /// A single-valued attribute carries several values.
    #[error("entry {dn} has {count} values for single-valued attribute {attribute}")]
    MultipleValues {
        /// Entry DN.
        dn: String,
        /// Attribute name.
        attribute: String,
        /// Number of values found.
        count: usize,
    },

    /// A numeric attribute does not parse.
    #[error("entry {dn} has non-numeric {attribute}: {value:?}")]
    InvalidNumber {
        /// Entry DN.
        dn: String,
        /// Attribute name.
        attribute: String,
        /// Offending value.
        value: String,
    },
}

impl ModelError {
    pub(crate) fn missing(dn: &str, attribute: &str) -> Self {
        Self::MissingAttribute {
            dn: dn.to_string(),
            attribute: attribute.to_string(),
        }
    }
}
