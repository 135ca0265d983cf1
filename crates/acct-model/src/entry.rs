//! Raw directory entries as returned by a gateway search.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A directory entry with its attributes.
///
/// Attribute names are compared case-insensitively, as the directory does.
/// Values are kept in the order the directory returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Distinguished Name.
    pub dn: String,

    /// Text attributes (all values are multi-valued).
    pub attributes: BTreeMap<String, Vec<String>>,

    /// Attributes whose values are not valid UTF-8.
    pub binary_attributes: BTreeMap<String, Vec<Vec<u8>>>,
}

impl DirectoryEntry {
    /// Creates an entry with no attributes.
    #[must_use]
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            ..Self::default()
        }
    }

    /// Adds a text value, builder style.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.add_value(name, value);
        self
    }

    /// Adds several text values, builder style.
    #[must_use]
    pub fn with_values<I, V>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        for value in values {
            self.add_value(name, value);
        }
        self
    }

    /// Adds a binary value, builder style.
    #[must_use]
    pub fn with_binary(mut self, name: &str, value: Vec<u8>) -> Self {
        let key = self
            .binary_attributes
            .keys()
            .find(|k| k.eq_ignore_ascii_case(name))
            .cloned()
            .unwrap_or_else(|| name.to_string());
        self.binary_attributes.entry(key).or_default().push(value);
        self
    }

    /// Gets the first value of an attribute.
    #[must_use]
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.get_attrs(name)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    /// Gets all values of an attribute.
    #[must_use]
    pub fn get_attrs(&self, name: &str) -> Option<&Vec<String>> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Gets all values of an attribute, empty when absent.
    #[must_use]
    pub fn values(&self, name: &str) -> Vec<String> {
        self.get_attrs(name).cloned().unwrap_or_default()
    }

    /// Checks if the entry has an attribute.
    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.get_attrs(name).is_some()
    }

    /// Finds the stored value equal to `value`, ignoring ASCII case.
    ///
    /// Directory matching rules for uids and DNs are case-insensitive, so a
    /// filter hit does not guarantee the stored value is byte-identical.
    #[must_use]
    pub fn find_value(&self, name: &str, value: &str) -> Option<&str> {
        self.get_attrs(name)?
            .iter()
            .find(|v| v.eq_ignore_ascii_case(value))
            .map(String::as_str)
    }

    /// Appends a value, merging with an existing attribute of any case.
    pub fn add_value(&mut self, name: &str, value: impl Into<String>) {
        let key = self.attribute_key(name);
        self.attributes.entry(key).or_default().push(value.into());
    }

    /// Removes the first value equal to `value` (ignoring case).
    ///
    /// Returns `true` if a value was removed. The attribute disappears with
    /// its last value.
    pub fn remove_value(&mut self, name: &str, value: &str) -> bool {
        let key = self.attribute_key(name);
        let Some(values) = self.attributes.get_mut(&key) else {
            return false;
        };
        let Some(pos) = values.iter().position(|v| v.eq_ignore_ascii_case(value)) else {
            return false;
        };
        values.remove(pos);
        if values.is_empty() {
            self.attributes.remove(&key);
        }
        true
    }

    /// Returns the RDN (leftmost DN component).
    #[must_use]
    pub fn rdn(&self) -> &str {
        split_rdn(&self.dn).0
    }

    /// Returns the DN of the parent entry.
    #[must_use]
    pub fn parent_dn(&self) -> &str {
        split_rdn(&self.dn).1
    }

    fn attribute_key(&self, name: &str) -> String {
        self.attributes
            .keys()
            .find(|k| k.eq_ignore_ascii_case(name))
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

/// Splits a DN into its RDN and parent DN.
///
/// Escaped commas (`\,`) inside the RDN are not treated as separators.
#[must_use]
pub fn split_rdn(dn: &str) -> (&str, &str) {
    let bytes = dn.as_bytes();
    let mut escaped = false;
    for (i, b) in bytes.iter().enumerate() {
        match b {
            b'\\' if !escaped => escaped = true,
            b',' if !escaped => return (&dn[..i], dn[i + 1..].trim_start()),
            _ => escaped = false,
        }
    }
    (dn, "")
}

/// Compares two DNs ignoring ASCII case and spaces after separators.
#[must_use]
pub fn dn_eq(a: &str, b: &str) -> bool {
    normalize_dn(a) == normalize_dn(b)
}

/// Lowercases a DN and strips whitespace around component separators.
#[must_use]
pub fn normalize_dn(dn: &str) -> String {
    dn.split(',')
        .map(|part| part.trim().to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join(",")
}
