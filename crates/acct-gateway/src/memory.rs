//! In-memory directory for tests and sandbox work.
//!
//! Entries are held in a map keyed by normalized DN. Bind credentials are
//! registered explicitly and never stored on entries. Faults can be
//! scheduled per operation kind to exercise partial-failure paths.

use std::collections::BTreeMap;

use acct_model::{normalize_dn, split_rdn, DirectoryEntry};

use crate::error::{GatewayError, GatewayResult};
use crate::filter::{Filter, SearchScope};
use crate::gateway::{AttributeList, DirectoryGateway, ModifyOp, Modification};

/// Gateway primitive kinds, for fault scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `bind`
    Bind,
    /// `search`
    Search,
    /// `add`
    Add,
    /// `modify`
    Modify,
    /// `rename_rdn`
    RenameRdn,
}

#[derive(Debug, Clone)]
struct ScheduledFault {
    operation: Operation,
    remaining: usize,
    error: GatewayError,
}

/// A directory held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    entries: BTreeMap<String, DirectoryEntry>,
    credentials: BTreeMap<String, String>,
    faults: Vec<ScheduledFault>,
    bound_dn: Option<String>,
    mutations: usize,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an entry without counting a mutation.
    pub fn insert(&mut self, entry: DirectoryEntry) {
        self.entries.insert(normalize_dn(&entry.dn), entry);
    }

    /// Inserts an entry, builder style.
    #[must_use]
    pub fn with_entry(mut self, entry: DirectoryEntry) -> Self {
        self.insert(entry);
        self
    }

    /// Registers a bind secret for `dn`.
    pub fn set_credentials(&mut self, dn: &str, secret: impl Into<String>) {
        self.credentials.insert(normalize_dn(dn), secret.into());
    }

    /// Registers a bind secret, builder style.
    #[must_use]
    pub fn with_credentials(mut self, dn: &str, secret: impl Into<String>) -> Self {
        self.set_credentials(dn, secret);
        self
    }

    /// Makes the `nth` upcoming call of `operation` fail with `error`.
    ///
    /// `nth` counts from 1; calls before it succeed normally. A fault fires
    /// once and is then discarded.
    pub fn fail_nth(&mut self, operation: Operation, nth: usize, error: GatewayError) {
        self.faults.push(ScheduledFault {
            operation,
            remaining: nth.max(1),
            error,
        });
    }

    /// Makes the next call of `operation` fail with `error`.
    pub fn fail_next(&mut self, operation: Operation, error: GatewayError) {
        self.fail_nth(operation, 1, error);
    }

    /// Drops every scheduled fault.
    pub fn clear_faults(&mut self) {
        self.faults.clear();
    }

    /// Looks up an entry by DN.
    #[must_use]
    pub fn entry(&self, dn: &str) -> Option<&DirectoryEntry> {
        self.entries.get(&normalize_dn(dn))
    }

    /// Checks whether an entry exists.
    #[must_use]
    pub fn contains(&self, dn: &str) -> bool {
        self.entries.contains_key(&normalize_dn(dn))
    }

    /// Returns all entries in DN order.
    pub fn entries(&self) -> impl Iterator<Item = &DirectoryEntry> {
        self.entries.values()
    }

    /// Returns a copy of every entry, for before/after comparisons.
    #[must_use]
    pub fn snapshot(&self) -> Vec<DirectoryEntry> {
        self.entries.values().cloned().collect()
    }

    /// Number of successful add, modify and rename calls.
    #[must_use]
    pub const fn mutation_count(&self) -> usize {
        self.mutations
    }

    /// DN of the last successful bind.
    #[must_use]
    pub fn bound_dn(&self) -> Option<&str> {
        self.bound_dn.as_deref()
    }

    fn check_fault(&mut self, operation: Operation) -> GatewayResult<()> {
        for fault in self.faults.iter_mut().filter(|f| f.operation == operation) {
            fault.remaining = fault.remaining.saturating_sub(1);
        }
        let fired = self
            .faults
            .iter()
            .position(|f| f.operation == operation && f.remaining == 0);
        match fired {
            Some(i) => Err(self.faults.remove(i).error),
            None => Ok(()),
        }
    }

    fn in_scope(entry_dn: &str, base: &str, scope: SearchScope) -> bool {
        match scope {
            SearchScope::Base => entry_dn == base,
            SearchScope::OneLevel => split_rdn(entry_dn).1 == base,
            SearchScope::Subtree => {
                base.is_empty()
                    || entry_dn == base
                    || entry_dn.ends_with(&format!(",{base}"))
            }
        }
    }

    fn project(entry: &DirectoryEntry, attributes: &[&str]) -> DirectoryEntry {
        if attributes.is_empty() || attributes.contains(&"*") {
            return entry.clone();
        }
        let keep = |name: &String| attributes.iter().any(|a| a.eq_ignore_ascii_case(name));
        DirectoryEntry {
            dn: entry.dn.clone(),
            attributes: entry
                .attributes
                .iter()
                .filter(|(name, _)| keep(name))
                .map(|(name, values)| (name.clone(), values.clone()))
                .collect(),
            binary_attributes: entry
                .binary_attributes
                .iter()
                .filter(|(name, _)| keep(name))
                .map(|(name, values)| (name.clone(), values.clone()))
                .collect(),
        }
    }
}

impl DirectoryGateway for InMemoryDirectory {
    fn bind(&mut self, dn: &str, secret: &str) -> GatewayResult<()> {
        self.check_fault(Operation::Bind)?;
        match self.credentials.get(&normalize_dn(dn)) {
            Some(stored) if !secret.is_empty() && stored == secret => {
                tracing::debug!(dn = %dn, "bind accepted");
                self.bound_dn = Some(dn.to_string());
                Ok(())
            }
            _ => Err(GatewayError::InvalidCredentials(dn.to_string())),
        }
    }

    fn search(
        &mut self,
        base: &str,
        scope: SearchScope,
        filter: &Filter,
        attributes: &[&str],
    ) -> GatewayResult<Vec<DirectoryEntry>> {
        self.check_fault(Operation::Search)?;
        let base_key = normalize_dn(base);
        if !base_key.is_empty() && !self.entries.contains_key(&base_key) {
            return Err(GatewayError::NoSuchObject(base.to_string()));
        }
        let found: Vec<_> = self
            .entries
            .iter()
            .filter(|(key, entry)| Self::in_scope(key, &base_key, scope) && filter.matches(entry))
            .map(|(_, entry)| Self::project(entry, attributes))
            .collect();
        tracing::debug!(base = %base, filter = %filter, count = found.len(), "search");
        Ok(found)
    }

    fn add(&mut self, dn: &str, attributes: AttributeList) -> GatewayResult<()> {
        self.check_fault(Operation::Add)?;
        let key = normalize_dn(dn);
        if self.entries.contains_key(&key) {
            return Err(GatewayError::AlreadyExists(dn.to_string()));
        }
        let parent = split_rdn(&key).1;
        if !parent.is_empty() && !self.entries.contains_key(parent) {
            return Err(GatewayError::NoSuchObject(split_rdn(dn).1.to_string()));
        }
        let mut entry = DirectoryEntry::new(dn);
        for (name, values) in attributes {
            for value in values {
                entry.add_value(&name, value);
            }
        }
        // the naming value is implied by the DN
        if let Some((name, value)) = split_rdn(dn).0.split_once('=') {
            if entry.find_value(name, value).is_none() {
                entry.add_value(name, value);
            }
        }
        self.entries.insert(key, entry);
        self.mutations += 1;
        Ok(())
    }

    fn modify(&mut self, dn: &str, changes: &[Modification]) -> GatewayResult<()> {
        self.check_fault(Operation::Modify)?;
        let key = normalize_dn(dn);
        let Some(current) = self.entries.get(&key) else {
            return Err(GatewayError::NoSuchObject(dn.to_string()));
        };

        // Changes apply to a copy so a rejected request leaves no trace.
        let mut updated = current.clone();
        for change in changes {
            match change.op {
                ModifyOp::Add => {
                    if updated.find_value(&change.attribute, &change.value).is_some() {
                        return Err(GatewayError::ValueExists {
                            dn: dn.to_string(),
                            attribute: change.attribute.clone(),
                            value: change.value.clone(),
                        });
                    }
                    updated.add_value(&change.attribute, change.value.clone());
                }
                ModifyOp::Delete => {
                    if !updated.remove_value(&change.attribute, &change.value) {
                        return Err(GatewayError::NoSuchValue {
                            dn: dn.to_string(),
                            attribute: change.attribute.clone(),
                            value: change.value.clone(),
                        });
                    }
                }
            }
        }
        self.entries.insert(key, updated);
        self.mutations += 1;
        Ok(())
    }

    fn rename_rdn(&mut self, dn: &str, new_rdn: &str) -> GatewayResult<()> {
        self.check_fault(Operation::RenameRdn)?;
        let key = normalize_dn(dn);
        let Some(mut entry) = self.entries.remove(&key) else {
            return Err(GatewayError::NoSuchObject(dn.to_string()));
        };

        let (old_rdn, parent) = split_rdn(dn);
        let new_dn = if parent.is_empty() {
            new_rdn.to_string()
        } else {
            format!("{new_rdn},{parent}")
        };
        let new_key = normalize_dn(&new_dn);
        if self.entries.contains_key(&new_key) {
            self.entries.insert(key, entry);
            return Err(GatewayError::AlreadyExists(new_dn));
        }

        if let Some((attr, value)) = old_rdn.split_once('=') {
            entry.remove_value(attr, value);
        }
        if let Some((attr, value)) = new_rdn.split_once('=') {
            if entry.find_value(attr, value).is_none() {
                entry.add_value(attr, value);
            }
        }
        entry.dn = new_dn;
        self.entries.insert(new_key, entry);
        self.mutations += 1;
        Ok(())
    }
}
