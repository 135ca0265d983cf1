//! # acct-ldif
//!
//! LDIF output for directory entries: the per-value base64 decision and a
//! record writer that applies it.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod encoding;
pub mod writer;

pub use encoding::{is_unsafe_bytes, Base64Policy, LdifValue};
pub use writer::{to_ldif_string, LdifWriter, DEFAULT_LINE_WIDTH};
