//! # acct-engine
//!
//! Identity lifecycle operations over a [`DirectoryGateway`]: session
//! authentication, uid/gid allocation, account creation, membership
//! changes, rename with reference propagation and LDIF export.
//!
//! ```no_run
//! use acct_core::Config;
//! use acct_engine::{AccountManager, NewAccount};
//! use acct_gateway::InMemoryDirectory;
//!
//! let directory = InMemoryDirectory::new();
//! let mut manager = AccountManager::authenticate(directory, Config::default(), "root", "secret")?;
//! let mut bob = manager.create_account(NewAccount::new("bob", "bob@example.org", "Bob Builder"))?;
//! bob.add_project("infra")?;
//! bob.rename("robert")?;
//! # Ok::<(), acct_engine::AccountError>(())
//! ```
//!
//! [`DirectoryGateway`]: acct_gateway::DirectoryGateway

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod allocator;
pub mod committer;
pub mod error;
pub mod manager;
pub mod password;
pub mod rename;
pub mod validator;

pub use allocator::{allocate, AllocationSnapshot};
pub use committer::Committer;
pub use error::{AccountError, AccountResult, AllocationError, ValidationField};
pub use manager::{AccountManager, NewAccount, Session};
pub use rename::{
    DanglingReference, RedirectInterrupted, RedirectReport, RedirectedReference,
    RenameInterrupted, RenameReport, RenameStep,
};
