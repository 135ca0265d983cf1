//! Numeric identity allocation.
//!
//! The allocator is a pure function over a snapshot of the uidNumbers and
//! gidNumbers currently in the directory. It does not reserve anything:
//! callers fetch a fresh snapshot immediately before each use.

use std::collections::BTreeSet;

use acct_model::account::{attr, number};
use acct_model::{DirectoryEntry, ModelResult};

use crate::error::AllocationError;

/// uidNumbers and gidNumbers in use at one moment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationSnapshot {
    /// Assigned uidNumbers.
    pub uids: BTreeSet<u32>,
    /// Assigned gidNumbers.
    pub gids: BTreeSet<u32>,
}

impl AllocationSnapshot {
    /// Creates a snapshot from explicit sets.
    pub fn new(
        uids: impl IntoIterator<Item = u32>,
        gids: impl IntoIterator<Item = u32>,
    ) -> Self {
        Self {
            uids: uids.into_iter().collect(),
            gids: gids.into_iter().collect(),
        }
    }

    /// Collects ids from account entries.
    ///
    /// Entries without a uidNumber or gidNumber (non-posix entries that
    /// still carry a `uid`) contribute nothing for that attribute. A value
    /// that does not parse is an error.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a DirectoryEntry>) -> ModelResult<Self> {
        let mut snapshot = Self::default();
        for entry in entries {
            if entry.has_attr(attr::UID_NUMBER) {
                snapshot.uids.insert(number(entry, attr::UID_NUMBER)?);
            }
            if entry.has_attr(attr::GID_NUMBER) {
                snapshot.gids.insert(number(entry, attr::GID_NUMBER)?);
            }
        }
        Ok(snapshot)
    }

    /// Checks whether `id` is free in both sets.
    #[must_use]
    pub fn is_free(&self, id: u32) -> bool {
        !self.uids.contains(&id) && !self.gids.contains(&id)
    }

    /// Runs [`allocate`] on this snapshot.
    pub fn allocate(&self, minimum: u32, maximum: Option<u32>) -> Result<u32, AllocationError> {
        allocate(&self.uids, &self.gids, minimum, maximum)
    }
}

/// Returns the smallest id `>= minimum` (and `<= maximum` when given) that
/// is absent from both `used_uids` and `used_gids`.
///
/// Candidates are the gaps in the used uids inside the window
/// `[minimum, max(used ∪ {minimum})]`, followed by one extra candidate just
/// past the highest used uid (stepped over any used gid). The first
/// candidate that is also free as a gid wins.
pub fn allocate(
    used_uids: &BTreeSet<u32>,
    used_gids: &BTreeSet<u32>,
    minimum: u32,
    maximum: Option<u32>,
) -> Result<u32, AllocationError> {
    let ceiling = maximum.unwrap_or(u32::MAX);
    let exhausted = AllocationError::Exhausted {
        minimum,
        maximum: ceiling,
    };
    if minimum > ceiling {
        return Err(exhausted);
    }

    let top = used_uids
        .iter()
        .chain(used_gids)
        .copied()
        .max()
        .map_or(minimum, |m| m.max(minimum));

    let mut extra = match used_uids.last() {
        Some(&highest) => highest.checked_add(1).map(|c| c.max(minimum)),
        None => Some(minimum),
    };
    while let Some(candidate) = extra {
        if !used_gids.contains(&candidate) {
            break;
        }
        extra = candidate.checked_add(1);
    }

    let gid_free = |id: &u32| {
        Some(*id) == extra || ((minimum..=top).contains(id) && !used_gids.contains(id))
    };

    (minimum..=top)
        .filter(|id| !used_uids.contains(id))
        .chain(extra)
        .filter(|id| *id >= minimum)
        .find(gid_free)
        .filter(|id| *id <= ceiling)
        .ok_or(exhausted)
}
