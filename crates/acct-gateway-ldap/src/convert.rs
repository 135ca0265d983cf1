//! Conversions between ldap3 types and gateway types.

use std::collections::HashSet;

use acct_gateway::{ModifyOp, Modification, SearchScope};
use acct_model::DirectoryEntry;
use ldap3::{Mod, Scope, SearchEntry};

/// Converts an ldap3 search entry into a [`DirectoryEntry`].
///
/// ldap3 already separates values that are not valid UTF-8 into
/// `bin_attrs`; the split is kept as is.
#[must_use]
pub fn entry_from_search(entry: SearchEntry) -> DirectoryEntry {
    DirectoryEntry {
        dn: entry.dn,
        attributes: entry.attrs.into_iter().collect(),
        binary_attributes: entry.bin_attrs.into_iter().collect(),
    }
}

/// Converts a gateway scope to an ldap3 scope.
#[must_use]
pub const fn scope(scope: SearchScope) -> Scope {
    match scope {
        SearchScope::Base => Scope::Base,
        SearchScope::OneLevel => Scope::OneLevel,
        SearchScope::Subtree => Scope::Subtree,
    }
}

/// Converts value changes into ldap3 modifications, preserving order.
#[must_use]
pub fn modifications(changes: &[Modification]) -> Vec<Mod<String>> {
    changes
        .iter()
        .map(|change| {
            let values = HashSet::from([change.value.clone()]);
            match change.op {
                ModifyOp::Add => Mod::Add(change.attribute.clone(), values),
                ModifyOp::Delete => Mod::Delete(change.attribute.clone(), values),
            }
        })
        .collect()
}

/// Requested attribute list; empty means all user attributes.
#[must_use]
pub fn attribute_list<'a>(attributes: &[&'a str]) -> Vec<&'a str> {
    if attributes.is_empty() {
        vec!["*"]
    } else {
        attributes.to_vec()
    }
}
