//! Session authentication tests.

use acct_core::{EventOutcome, EventType};
use acct_engine::AccountError;
use acct_gateway::{GatewayError, Operation};
use acct_model::DirectoryEntry;

use crate::common::{TestEnv, ALICE_PASSWORD, APLDAP, ROOT_DN, ROOT_PASSWORD};

/// Tests that a member of the admin group gets an admin session.
#[test]
fn test_admin_session() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let manager = env.login_admin()?;

    assert_eq!(manager.uid(), "root");
    assert_eq!(manager.dn(), ROOT_DN);
    assert_eq!(manager.full_name(), "Root Admin");
    assert_eq!(manager.email(), Some("root@example.org"));
    assert!(manager.is_admin());

    let opened = env.audit.events_of(EventType::SessionOpened);
    assert_eq!(opened.len(), 1);
    assert_eq!(opened[0].actor.as_deref(), Some("root"));
    assert_eq!(opened[0].detail("admin"), Some("true"));
    Ok(())
}

/// Tests that an ordinary committer session is not admin.
#[test]
fn test_committer_session() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let manager = env.login("alice", ALICE_PASSWORD)?;
    assert!(!manager.is_admin());
    assert_eq!(manager.session().full_name, "Alice Liddell");
    Ok(())
}

/// Tests that a wrong password is a connection fault and is audited.
#[test]
fn test_bad_password() {
    let env = TestEnv::new();
    let err = env.login("root", "not-the-password").unwrap_err();

    assert!(err.is_connection_error(), "unexpected error: {err}");
    let rejected = env.audit.events_of(EventType::SessionRejected);
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].outcome, EventOutcome::Failure);
    assert!(env.audit.events_of(EventType::SessionOpened).is_empty());
}

/// Tests that an empty password never binds.
#[test]
fn test_empty_password() {
    let env = TestEnv::new();
    assert!(env.login("root", "").unwrap_err().is_connection_error());
}

/// Tests that malformed logins are refused before any bind.
#[test]
fn test_malformed_login() {
    let env = TestEnv::new();
    for login in ["Root", "root)(uid=*", "root,ou=x", ""] {
        let err = env.login(login, ROOT_PASSWORD).unwrap_err();
        assert!(err.is_connection_error(), "{login:?}: {err}");
    }
}

/// Tests that a bind timeout surfaces as a connection fault.
#[test]
fn test_bind_timeout() {
    let mut env = TestEnv::new();
    env.directory
        .fail_next(Operation::Bind, GatewayError::timeout("bind"));
    let err = env.login_admin().unwrap_err();
    assert!(matches!(err, AccountError::Connection(GatewayError::Timeout(_))));
}

/// Tests that a timeout while loading the profile is a connection fault.
#[test]
fn test_profile_timeout() {
    let mut env = TestEnv::new();
    env.directory
        .fail_next(Operation::Search, GatewayError::timeout("search"));
    assert!(env.login_admin().unwrap_err().is_connection_error());
}

/// Tests that an admin group without members is a consistency fault.
#[test]
fn test_empty_admin_group() {
    let mut env = TestEnv::new();
    env.directory.insert(
        DirectoryEntry::new(APLDAP)
            .with("objectClass", "groupOfNames")
            .with("cn", "apldap"),
    );
    let err = env.login_admin().unwrap_err();
    assert!(matches!(err, AccountError::Consistency(_)), "unexpected error: {err}");
}

/// Tests that a profile with two common names is a consistency fault.
#[test]
fn test_ambiguous_profile() {
    let mut env = TestEnv::new();
    let profile = env
        .directory
        .entry(ROOT_DN)
        .cloned()
        .expect("root is seeded")
        .with("cn", "Another Name");
    env.directory.insert(profile);
    let err = env.login_admin().unwrap_err();
    assert!(matches!(err, AccountError::Consistency(_)));
}
