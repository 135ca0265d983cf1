//! # acct-gateway-ldap
//!
//! LDAPS directory gateway for the account manager.
//!
//! This crate implements [`acct_gateway::DirectoryGateway`] on top of a
//! blocking `ldap3` connection. Only `ldaps://` URLs are accepted.
//!
//! ```no_run
//! use acct_gateway_ldap::{LdapConfig, LdapGateway};
//!
//! let config = LdapConfig::builder()
//!     .connection_url("ldaps://ldap-eu.apache.org:636")
//!     .build()?;
//! let gateway = LdapGateway::connect(config)?;
//! # Ok::<(), acct_gateway_ldap::LdapError>(())
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod connection;
pub mod convert;
pub mod error;
pub mod gateway;

pub use config::{LdapConfig, LdapConfigBuilder};
pub use connection::LdapConnection;
pub use error::{LdapError, LdapResult};
pub use gateway::LdapGateway;
