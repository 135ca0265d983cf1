//! End-to-end integration tests
//!
//! These tests drive the account manager against a seeded in-memory
//! directory shaped like the production tree.

mod common;
mod accounts;
mod auth;
mod export;
mod membership;
mod redirect;
mod rename;
