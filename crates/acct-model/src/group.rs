//! Group-like entries: projects, roles, posix groups and service groups.

use serde::{Deserialize, Serialize};

use crate::account::{number, single};
use crate::entry::DirectoryEntry;
use crate::error::ModelResult;

/// Membership attribute names.
pub mod attr {
    /// Full-DN membership (projects, roles, service groups).
    pub const MEMBER: &str = "member";
    /// Full-DN ownership (PMC membership on project entries).
    pub const OWNER: &str = "owner";
    /// Bare-uid membership (posix groups).
    pub const MEMBER_UID: &str = "memberUid";
    /// Common name.
    pub const CN: &str = "cn";
    /// Object class of posix groups.
    pub const POSIX_GROUP: &str = "posixGroup";
}

/// A project entry. Committers are `member`, PMC members are `owner`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEntry {
    /// Distinguished Name.
    pub dn: String,
    /// Project name.
    pub cn: String,
    /// Committer DNs.
    pub members: Vec<String>,
    /// PMC member DNs.
    pub owners: Vec<String>,
}

impl ProjectEntry {
    /// Converts a search result.
    pub fn from_entry(entry: &DirectoryEntry) -> ModelResult<Self> {
        Ok(Self {
            dn: entry.dn.clone(),
            cn: single(entry, attr::CN)?.to_string(),
            members: entry.values(attr::MEMBER),
            owners: entry.values(attr::OWNER),
        })
    }
}

/// A role entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleEntry {
    /// Distinguished Name.
    pub dn: String,
    /// Role name.
    pub cn: String,
    /// Member DNs.
    pub members: Vec<String>,
}

impl RoleEntry {
    /// Converts a search result.
    pub fn from_entry(entry: &DirectoryEntry) -> ModelResult<Self> {
        Ok(Self {
            dn: entry.dn.clone(),
            cn: single(entry, attr::CN)?.to_string(),
            members: entry.values(attr::MEMBER),
        })
    }
}

/// A posix group. Members are bare uids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosixGroupEntry {
    /// Distinguished Name.
    pub dn: String,
    /// Group name.
    pub cn: String,
    /// Numeric group id, when set.
    pub gid_number: Option<u32>,
    /// Member uids.
    pub member_uids: Vec<String>,
}

impl PosixGroupEntry {
    /// Converts a search result.
    pub fn from_entry(entry: &DirectoryEntry) -> ModelResult<Self> {
        let gid_number = if entry.has_attr("gidNumber") {
            Some(number(entry, "gidNumber")?)
        } else {
            None
        };
        Ok(Self {
            dn: entry.dn.clone(),
            cn: single(entry, attr::CN)?.to_string(),
            gid_number,
            member_uids: entry.values(attr::MEMBER_UID),
        })
    }

    /// Checks membership, ignoring case.
    #[must_use]
    pub fn has_member(&self, uid: &str) -> bool {
        self.member_uids.iter().any(|m| m.eq_ignore_ascii_case(uid))
    }
}

/// A service group such as the account-administrators group.
///
/// Unlike the other records the common name is optional; only the member
/// list matters to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceGroupEntry {
    /// Distinguished Name.
    pub dn: String,
    /// Group name, if set.
    pub cn: Option<String>,
    /// Member DNs.
    pub members: Vec<String>,
}

impl ServiceGroupEntry {
    /// Converts a search result.
    #[must_use]
    pub fn from_entry(entry: &DirectoryEntry) -> Self {
        Self {
            dn: entry.dn.clone(),
            cn: entry.get_attr(attr::CN).map(String::from),
            members: entry.values(attr::MEMBER),
        }
    }

    /// Checks whether a DN is a member.
    #[must_use]
    pub fn contains(&self, dn: &str) -> bool {
        self.members.iter().any(|m| crate::entry::dn_eq(m, dn))
    }
}
