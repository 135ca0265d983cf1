//! # acct-core
//!
//! Configuration and audit events shared by the directory account manager
//! crates.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod event;

pub use config::{
    AccountTemplate, Config, DirectoryLayout, GidAssignment, IdentityPolicy, PasswordScheme,
};
pub use error::{ConfigError, ConfigResult};
pub use event::{
    AuditEvent, AuditEventBuilder, AuditSink, EventOutcome, EventType, InMemoryAuditSink,
    TracingAuditSink,
};
