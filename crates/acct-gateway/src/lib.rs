//! # acct-gateway
//!
//! The directory gateway seam.
//!
//! This crate defines the primitives the account engine needs from a
//! directory (bind, search, add, modify, rename-RDN) as the
//! [`DirectoryGateway`] trait, together with typed search filters and the
//! error type every implementation reports.
//!
//! ## Implementations
//!
//! - [`InMemoryDirectory`]: map-backed directory with fault injection
//! - `acct-gateway-ldap`: LDAPS server access through ldap3

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod filter;
pub mod gateway;
pub mod memory;

pub use error::{GatewayError, GatewayResult};
pub use filter::{ldap_escape, Filter, SearchScope};
pub use gateway::{AttributeList, DirectoryGateway, Modification, ModifyOp};
pub use memory::{InMemoryDirectory, Operation};
