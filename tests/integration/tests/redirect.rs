//! Standalone reference redirection tests.

use acct_core::EventType;
use acct_engine::AccountError;
use acct_gateway::{GatewayError, Operation};

use crate::common::{TestEnv, ALICE_DN, BOB_DN, INFRA, INFRA_POSIX};

const ROBERT_DN: &str = "uid=robert,ou=people,dc=apache,dc=org";

/// Tests that running a redirect twice leaves the same state.
#[test]
fn test_redirect_is_idempotent() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let mut manager = env.login_admin()?;

    let first = manager.redirect_uid("bob", "robert")?;
    assert_eq!(first.redirected.len(), 2);
    let after_first = manager.gateway().snapshot();

    let second = manager.redirect_uid("bob", "robert")?;
    assert!(second.redirected.is_empty());
    assert_eq!(manager.gateway().snapshot(), after_first);

    let infra = manager.gateway().entry(INFRA).expect("seeded");
    assert!(infra.find_value("member", ROBERT_DN).is_some());
    assert!(infra.find_value("member", BOB_DN).is_none());
    let posix = manager.gateway().entry(INFRA_POSIX).expect("seeded");
    assert!(posix.find_value("memberUid", "robert").is_some());
    assert!(posix.find_value("memberUid", "bob").is_none());

    assert_eq!(env.audit.events_of(EventType::ReferencesRedirected).len(), 2);
    Ok(())
}

/// Tests that an existing target reference is kept once and the old one
/// removed.
#[test]
fn test_redirect_onto_existing_member() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let mut manager = env.login_admin()?;

    manager.redirect_uid("alice", "bob")?;

    let infra = manager.gateway().entry(INFRA).expect("seeded");
    assert_eq!(infra.values("member"), vec![BOB_DN.to_string()]);
    assert_eq!(infra.values("owner"), vec![BOB_DN.to_string()]);
    let posix = manager.gateway().entry(INFRA_POSIX).expect("seeded");
    assert_eq!(posix.values("memberUid"), vec!["bob".to_string()]);
    // The account entry itself is left alone.
    assert!(manager.gateway().contains(ALICE_DN));
    Ok(())
}

/// Tests that a redirect onto itself changes nothing.
#[test]
fn test_redirect_to_self() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let mut manager = env.login_admin()?;

    let report = manager.redirect_uid("alice", "alice")?;
    assert!(report.redirected.is_empty());
    assert_eq!(manager.gateway().mutation_count(), 0);
    Ok(())
}

/// Tests that both identifiers are validated.
#[test]
fn test_redirect_validation() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let mut manager = env.login_admin()?;

    for (from, to) in [("Bob", "robert"), ("bob", "rob-ert"), ("bob", "*")] {
        let err = manager.redirect_uid(from, to).unwrap_err();
        assert!(matches!(err, AccountError::Validation { .. }), "{from} -> {to}");
    }
    assert_eq!(manager.gateway().mutation_count(), 0);
    Ok(())
}

/// Tests that a lost add surfaces as a partial redirect and that resuming
/// restores the membership.
#[test]
fn test_redirect_interrupted_after_delete_is_resumable() -> anyhow::Result<()> {
    let mut env = TestEnv::new();
    // Modify 1 deletes bob from infra, 2 would add robert.
    env.directory
        .fail_nth(Operation::Modify, 2, GatewayError::timeout("modify"));
    let mut manager = env.login_admin()?;

    let err = manager.redirect_uid("bob", "robert").unwrap_err();
    assert!(err.is_partial_mutation());
    assert!(!err.is_connection_error());
    let progress = err.redirect_interrupted().cloned().expect("progress record");
    assert_eq!(progress.dangling.len(), 1);
    assert_eq!(progress.dangling[0].dn, INFRA);
    assert_eq!(progress.dangling[0].attribute, "member");
    assert_eq!(progress.dangling[0].value, ROBERT_DN);

    let infra = manager.gateway().entry(INFRA).expect("seeded");
    assert!(infra.find_value("member", BOB_DN).is_none());
    assert!(infra.find_value("member", ROBERT_DN).is_none());

    // A plain retry no longer sees the old reference.
    let retry = manager.redirect_uid("bob", "robert")?;
    assert!(retry.redirected.iter().all(|r| r.attribute != "member"));

    let report = manager.resume_redirect(&progress)?;
    assert!(report.redirected.iter().any(|r| r.dn == INFRA && r.attribute == "member"));

    let infra = manager.gateway().entry(INFRA).expect("seeded");
    assert!(infra.find_value("member", ROBERT_DN).is_some());
    assert!(infra.find_value("member", ALICE_DN).is_some());
    let posix = manager.gateway().entry(INFRA_POSIX).expect("seeded");
    assert!(posix.find_value("memberUid", "robert").is_some());
    assert!(posix.find_value("memberUid", "bob").is_none());

    assert_eq!(env.audit.events_of(EventType::RedirectInterrupted).len(), 1);
    assert_eq!(env.audit.events_of(EventType::RedirectResumed).len(), 1);
    Ok(())
}

/// Tests that a failure between sweeps carries the references already
/// moved.
#[test]
fn test_redirect_interrupted_between_sweeps() -> anyhow::Result<()> {
    let mut env = TestEnv::new();
    // Modifies 1 and 2 move infra's member, 3 is the memberUid delete.
    env.directory
        .fail_nth(Operation::Modify, 3, GatewayError::timeout("modify"));
    let mut manager = env.login_admin()?;

    let err = manager.redirect_uid("bob", "robert").unwrap_err();
    let progress = err.redirect_interrupted().cloned().expect("progress record");
    assert!(progress.dangling.is_empty());
    assert_eq!(progress.redirected.len(), 1);
    let posix = manager.gateway().entry(INFRA_POSIX).expect("seeded");
    assert!(posix.find_value("memberUid", "bob").is_some());

    let report = manager.resume_redirect(&progress)?;
    assert_eq!(report.redirected.len(), 2);
    let posix = manager.gateway().entry(INFRA_POSIX).expect("seeded");
    assert_eq!(posix.values("memberUid"), vec!["alice".to_string(), "robert".to_string()]);
    Ok(())
}

/// Tests that a failure before any write is an ordinary retryable fault.
#[test]
fn test_redirect_failure_before_any_write_is_plain() -> anyhow::Result<()> {
    let mut env = TestEnv::new();
    env.directory
        .fail_next(Operation::Modify, GatewayError::timeout("modify"));
    let mut manager = env.login_admin()?;

    let err = manager.redirect_uid("bob", "robert").unwrap_err();
    assert!(err.is_connection_error());
    assert!(!err.is_partial_mutation());
    assert_eq!(manager.gateway().mutation_count(), 0);

    let report = manager.redirect_uid("bob", "robert")?;
    assert_eq!(report.redirected.len(), 2);
    Ok(())
}
