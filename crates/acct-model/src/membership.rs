//! Membership categories and the form of their references.

use serde::{Deserialize, Serialize};

use crate::group::attr;

/// How a group-like entry refers to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceForm {
    /// The account's full DN.
    FullDn,
    /// The account's bare uid.
    BareUid,
}

impl ReferenceForm {
    /// Picks the reference value for an account.
    #[must_use]
    pub fn value<'a>(self, dn: &'a str, uid: &'a str) -> &'a str {
        match self {
            Self::FullDn => dn,
            Self::BareUid => uid,
        }
    }
}

/// Kinds of membership an account can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipCategory {
    /// Committer on a project.
    Project,
    /// PMC member on a project.
    Pmc,
    /// Member of a posix group.
    BasicGroup,
    /// Holder of a role.
    Role,
}

impl MembershipCategory {
    /// All categories.
    pub const ALL: [Self; 4] = [Self::Project, Self::Pmc, Self::BasicGroup, Self::Role];

    /// The membership attribute on the group entry.
    #[must_use]
    pub const fn attribute(self) -> &'static str {
        match self {
            Self::Project | Self::Role => attr::MEMBER,
            Self::Pmc => attr::OWNER,
            Self::BasicGroup => attr::MEMBER_UID,
        }
    }

    /// The form of the stored reference.
    #[must_use]
    pub const fn reference_form(self) -> ReferenceForm {
        match self {
            Self::BasicGroup => ReferenceForm::BareUid,
            Self::Project | Self::Pmc | Self::Role => ReferenceForm::FullDn,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Pmc => "pmc",
            Self::BasicGroup => "basic group",
            Self::Role => "role",
        }
    }
}

impl std::fmt::Display for MembershipCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
