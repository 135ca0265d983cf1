//! # acct-model
//!
//! Typed directory records for the account manager.
//!
//! Gateways return loosely typed [`DirectoryEntry`] values; the engine
//! converts them into one record type per entry category at the boundary,
//! so a missing or malformed attribute surfaces as a [`ModelError`] instead
//! of a panic deep inside an operation.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod account;
pub mod entry;
pub mod error;
pub mod group;
pub mod membership;

pub use account::Account;
pub use entry::{dn_eq, normalize_dn, split_rdn, DirectoryEntry};
pub use error::{ModelError, ModelResult};
pub use group::{PosixGroupEntry, ProjectEntry, RoleEntry, ServiceGroupEntry};
pub use membership::{MembershipCategory, ReferenceForm};
