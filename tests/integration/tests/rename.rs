//! Rename propagation tests.

use acct_core::EventType;
use acct_engine::{AccountError, RenameStep, ValidationField};
use acct_gateway::{GatewayError, InMemoryDirectory, Operation};

use crate::common::{
    references_to, TestEnv, ALICE_DN, ALICIA_DN, BOARD, INFRA, INFRA_POSIX,
};

fn assert_fully_renamed(directory: &InMemoryDirectory) {
    assert!(!directory.contains(ALICE_DN));
    let account = directory.entry(ALICIA_DN).expect("renamed entry exists");
    assert_eq!(account.values("uid"), vec!["alicia".to_string()]);
    assert_eq!(account.get_attr("uidNumber"), Some("6001"));
    assert_eq!(account.get_attr("gidNumber"), Some("6001"));
    assert_eq!(account.get_attr("asf-committer-email"), Some("alicia@apache.org"));
    assert_eq!(account.get_attr("homeDirectory"), Some("/home/alicia"));

    let infra = directory.entry(INFRA).expect("infra exists");
    assert!(infra.find_value("member", ALICIA_DN).is_some());
    assert!(infra.find_value("owner", ALICIA_DN).is_some());
    let posix = directory.entry(INFRA_POSIX).expect("infra-posix exists");
    assert!(posix.find_value("memberUid", "alicia").is_some());
    let board = directory.entry(BOARD).expect("board exists");
    assert!(board.find_value("member", ALICIA_DN).is_some());

    let stale_dn = references_to(directory, ALICE_DN);
    assert!(stale_dn.is_empty(), "old DN still referenced: {stale_dn:?}");
    let stale_uid = references_to(directory, "alice");
    assert!(stale_uid.is_empty(), "old uid still referenced: {stale_uid:?}");
}

/// Tests that a rename moves the account and every reference to it.
#[test]
fn test_rename_propagates_references() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let mut manager = env.login_admin()?;

    let mut alice = manager.load_account("alice")?.expect("alice is seeded");
    let report = alice.rename("alicia")?;

    assert_eq!(alice.uid(), "alicia");
    assert_eq!(alice.dn(), ALICIA_DN);
    assert_eq!(alice.account().uid_number, 6001);
    assert_eq!(report.old_dn, ALICE_DN);
    assert_eq!(report.new_dn, ALICIA_DN);
    assert_eq!((report.uid_number, report.gid_number), (6001, 6001));
    // member and owner on infra, member on board, memberUid on infra-posix
    assert_eq!(report.redirected.len(), 4);

    assert_fully_renamed(manager.gateway());
    let bob_posix = manager.load_posix_group("infra-posix")?.expect("seeded");
    assert!(bob_posix.has_member("bob"));

    let renamed = env.audit.events_of(EventType::AccountRenamed);
    assert_eq!(renamed.len(), 1);
    assert_eq!(renamed[0].detail("old_uid"), Some("alice"));
    Ok(())
}

/// Tests that collisions stop a rename before any write.
#[test]
fn test_rename_collision() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let mut manager = env.login_admin()?;

    let mut alice = manager.load_account("alice")?.expect("alice is seeded");
    for target in ["bob", "infra", "Alicia", "al-icia"] {
        match alice.rename(target).unwrap_err() {
            AccountError::Validation { field, .. } => assert_eq!(field, ValidationField::Uid),
            other => panic!("{target}: expected a validation fault, got {other:?}"),
        }
    }
    assert_eq!(alice.uid(), "alice");
    drop(alice);
    assert_eq!(manager.gateway().mutation_count(), 0);
    Ok(())
}

/// Tests that a failing first write is a plain connection fault.
#[test]
fn test_rename_fails_before_mutation() -> anyhow::Result<()> {
    let mut env = TestEnv::new();
    env.directory
        .fail_next(Operation::Modify, GatewayError::timeout("modify"));
    let mut manager = env.login_admin()?;

    let mut alice = manager.load_account("alice")?.expect("alice is seeded");
    let err = alice.rename("alicia").unwrap_err();
    assert!(err.is_connection_error(), "unexpected error: {err}");
    assert!(!err.is_partial_mutation());
    drop(alice);
    assert_eq!(manager.gateway().mutation_count(), 0);
    Ok(())
}

/// Tests the partial state after a failed RDN change, and that resuming
/// completes the rename.
#[test]
fn test_rdn_failure_then_resume() -> anyhow::Result<()> {
    let mut env = TestEnv::new();
    env.directory
        .fail_next(Operation::RenameRdn, GatewayError::protocol("server busy"));
    let mut manager = env.login_admin()?;

    let err = {
        let mut alice = manager.load_account("alice")?.expect("alice is seeded");
        alice.rename("alicia").unwrap_err()
    };
    assert!(err.is_partial_mutation());
    let progress = err.interrupted().cloned().expect("progress record");
    assert_eq!(progress.failed_step, RenameStep::RenameRdn);
    assert_eq!(
        progress.completed,
        vec![RenameStep::AllocateIdentity, RenameStep::UpdateAttributes]
    );
    assert!(progress.dangling.is_empty());

    // New numeric ids under the old DN.
    let stuck = manager.gateway().entry(ALICE_DN).expect("old DN still exists");
    assert_eq!(stuck.get_attr("uidNumber"), Some("6001"));
    assert_eq!(stuck.get_attr("homeDirectory"), Some("/home/alicia"));
    assert!(!manager.gateway().contains(ALICIA_DN));
    assert_eq!(env.audit.events_of(EventType::RenameInterrupted).len(), 1);

    let report = manager.resume_rename(&progress)?;
    assert_eq!(report.new_dn, ALICIA_DN);
    assert_fully_renamed(manager.gateway());
    assert_eq!(env.audit.events_of(EventType::RenameResumed).len(), 1);

    assert!(manager.load_account("alice")?.is_none());
    let alicia = manager.load_account("alicia")?.expect("renamed").into_account();
    assert_eq!(alicia.uid_number, 6001);
    Ok(())
}

/// Tests that a lost add during the sweep is reported and restored.
#[test]
fn test_dangling_reference_then_resume() -> anyhow::Result<()> {
    let mut env = TestEnv::new();
    // Modify 1 is the attribute update, 2 the first delete, 3 its add.
    env.directory
        .fail_nth(Operation::Modify, 3, GatewayError::timeout("modify"));
    let mut manager = env.login_admin()?;

    let err = {
        let mut alice = manager.load_account("alice")?.expect("alice is seeded");
        alice.rename("alicia").unwrap_err()
    };
    let progress = err.interrupted().cloned().expect("progress record");
    assert_eq!(progress.failed_step, RenameStep::RedirectMembers);
    assert!(progress.completed.contains(&RenameStep::RenameRdn));
    assert_eq!(progress.dangling.len(), 1);
    let dangling = &progress.dangling[0];
    assert_eq!(dangling.attribute, "member");
    assert_eq!(dangling.value, ALICIA_DN);

    let group = manager.gateway().entry(&dangling.dn).expect("group exists");
    assert!(group.find_value("member", ALICE_DN).is_none());
    assert!(group.find_value("member", ALICIA_DN).is_none());

    manager.resume_rename(&progress)?;
    assert_fully_renamed(manager.gateway());
    Ok(())
}

/// Tests that resuming twice is harmless.
#[test]
fn test_resume_is_repeatable() -> anyhow::Result<()> {
    let mut env = TestEnv::new();
    env.directory
        .fail_next(Operation::RenameRdn, GatewayError::protocol("server busy"));
    let mut manager = env.login_admin()?;

    let err = manager
        .load_account("alice")?
        .expect("alice is seeded")
        .rename("alicia")
        .unwrap_err();
    let progress = err.interrupted().cloned().expect("progress record");

    manager.resume_rename(&progress)?;
    let second = manager.resume_rename(&progress)?;
    assert!(second.redirected.is_empty());
    assert_fully_renamed(manager.gateway());
    Ok(())
}
