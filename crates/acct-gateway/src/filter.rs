//! Typed search filters.
//!
//! Filters are built as values and rendered to RFC 4515 text only at the
//! wire boundary, so assertion values are always escaped.

use std::fmt;

use acct_model::DirectoryEntry;

/// Search scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    /// Only the base entry.
    Base,
    /// Direct children of the base.
    OneLevel,
    /// The base and everything below it.
    #[default]
    Subtree,
}

/// A search filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `(attr=value)`
    Equals(String, String),
    /// `(attr=*)`
    Present(String),
    /// `(&...)`
    And(Vec<Filter>),
    /// `(|...)`
    Or(Vec<Filter>),
}

impl Filter {
    /// Builds an equality filter.
    #[must_use]
    pub fn equals(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equals(attribute.into(), value.into())
    }

    /// Builds a presence filter.
    #[must_use]
    pub fn present(attribute: impl Into<String>) -> Self {
        Self::Present(attribute.into())
    }

    /// Builds a conjunction.
    #[must_use]
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self::And(filters.into_iter().collect())
    }

    /// Builds a disjunction.
    #[must_use]
    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self::Or(filters.into_iter().collect())
    }

    /// Matches an entry the way a directory would.
    ///
    /// Values compare ignoring ASCII case, which is the matching rule of
    /// every attribute the engine filters on (uid, cn, member, owner,
    /// memberUid, objectClass).
    #[must_use]
    pub fn matches(&self, entry: &DirectoryEntry) -> bool {
        match self {
            Self::Equals(attr, value) => entry.find_value(attr, value).is_some(),
            Self::Present(attr) => {
                entry.has_attr(attr)
                    || entry
                        .binary_attributes
                        .keys()
                        .any(|k| k.eq_ignore_ascii_case(attr))
            }
            Self::And(filters) => filters.iter().all(|f| f.matches(entry)),
            Self::Or(filters) => filters.iter().any(|f| f.matches(entry)),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals(attr, value) => write!(f, "({attr}={})", ldap_escape(value)),
            Self::Present(attr) => write!(f, "({attr}=*)"),
            Self::And(filters) => {
                f.write_str("(&")?;
                for filter in filters {
                    write!(f, "{filter}")?;
                }
                f.write_str(")")
            }
            Self::Or(filters) => {
                f.write_str("(|")?;
                for filter in filters {
                    write!(f, "{filter}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Escapes special characters in LDAP filter values.
#[must_use]
pub fn ldap_escape(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => result.push_str("\\5c"),
            '*' => result.push_str("\\2a"),
            '(' => result.push_str("\\28"),
            ')' => result.push_str("\\29"),
            '\0' => result.push_str("\\00"),
            _ => result.push(c),
        }
    }
    result
}
