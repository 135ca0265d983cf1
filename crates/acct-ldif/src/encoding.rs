//! Base64 decision policy for LDIF attribute values.
//!
//! A value is written as `attr:: <base64>` instead of `attr: <value>` when
//! it could not survive the plain LDIF form. The byte-level heuristic
//! matches python-ldap's `LDIFWriter`, so output compares cleanly against
//! dumps produced by existing tooling.

use std::collections::BTreeSet;

/// An attribute value as handed to the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LdifValue<'a> {
    /// A text value.
    Text(&'a str),
    /// A raw byte value.
    Bytes(&'a [u8]),
}

impl<'a> LdifValue<'a> {
    /// Returns the value's bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &'a [u8] {
        match *self {
            Self::Text(text) => text.as_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }
}

impl<'a> From<&'a str> for LdifValue<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(value)
    }
}

impl<'a> From<&'a [u8]> for LdifValue<'a> {
    fn from(value: &'a [u8]) -> Self {
        Self::Bytes(value)
    }
}

/// Returns true if `bytes` cannot be written as a plain LDIF value.
///
/// Unsafe when the value starts with NUL, LF, CR, space, `:` or `<`,
/// contains NUL, LF, CR or any byte at or above 0x80, or ends with a space.
#[must_use]
pub fn is_unsafe_bytes(bytes: &[u8]) -> bool {
    let Some((&first, _)) = bytes.split_first() else {
        return false;
    };
    if matches!(first, 0 | b'\n' | b'\r' | b' ' | b':' | b'<') {
        return true;
    }
    if bytes
        .iter()
        .any(|&b| matches!(b, 0 | b'\n' | b'\r') || b >= 0x80)
    {
        return true;
    }
    bytes.last() == Some(&b' ')
}

/// Decides which values get base64-encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Base64Policy {
    /// Lowercased names of attributes that are always encoded.
    always: BTreeSet<String>,
}

impl Base64Policy {
    /// Creates a policy with no always-encoded attributes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an attribute whose values are always encoded.
    #[must_use]
    pub fn with_attribute(mut self, name: &str) -> Self {
        self.always.insert(name.to_ascii_lowercase());
        self
    }

    /// Checks if an attribute is in the always-encoded set.
    #[must_use]
    pub fn is_always_encoded(&self, name: &str) -> bool {
        self.always.contains(&name.to_ascii_lowercase())
    }

    /// Decision for raw bytes: the always-encoded set, then the heuristic.
    #[must_use]
    pub fn default_decision(&self, name: &str, bytes: &[u8]) -> bool {
        self.is_always_encoded(name) || is_unsafe_bytes(bytes)
    }

    /// Decides whether `value` of attribute `name` must be base64-encoded.
    ///
    /// The `dn` attribute is never encoded, whatever its content.
    #[must_use]
    pub fn needs_base64(&self, name: &str, value: LdifValue<'_>) -> bool {
        if name.eq_ignore_ascii_case("dn") {
            return false;
        }
        match value {
            LdifValue::Bytes(bytes) => self.default_decision(name, bytes),
            LdifValue::Text(_) if self.is_always_encoded(name) => true,
            // Text is UTF-8 by construction, so the byte view always exists.
            LdifValue::Text(text) => is_unsafe_bytes(text.as_bytes()),
        }
    }
}
