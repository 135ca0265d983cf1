//! Account creation and allocation tests.

use acct_core::EventType;
use acct_engine::{AccountError, NewAccount, ValidationField};

use crate::common::{TestEnv, ALICE_PASSWORD};

fn validation_field(err: AccountError) -> ValidationField {
    match err {
        AccountError::Validation { field, .. } => field,
        other => panic!("expected a validation fault, got {other:?}"),
    }
}

/// Tests that a malformed uid is rejected and leaves the directory unchanged.
#[test]
fn test_invalid_uid_leaves_directory_unchanged() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let mut manager = env.login_admin()?;
    let before = manager.gateway().snapshot();

    let err = manager
        .create_account(NewAccount::new("My-Name", "me@example.org", "My Name"))
        .unwrap_err();

    assert_eq!(validation_field(err), ValidationField::Uid);
    assert_eq!(manager.gateway().snapshot(), before);
    assert_eq!(manager.gateway().mutation_count(), 0);
    Ok(())
}

/// Tests the name and email rules.
#[test]
fn test_name_and_email_rules() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let mut manager = env.login_admin()?;

    let cases = [
        (NewAccount::new("carol", "carol@example.org", "Carol"), ValidationField::FullName),
        (NewAccount::new("carol", "carol@example.org", "Carol  Danvers"), ValidationField::FullName),
        (NewAccount::new("carol", "carol@example", "Carol Danvers"), ValidationField::Email),
        (NewAccount::new("carol", "not an address", "Carol Danvers"), ValidationField::Email),
    ];
    for (request, expected) in cases {
        let err = manager.create_account(request).unwrap_err();
        assert_eq!(validation_field(err), expected);
    }
    assert_eq!(manager.gateway().mutation_count(), 0);
    Ok(())
}

/// Tests that uids taken by accounts or common names are collisions.
#[test]
fn test_collisions() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let mut manager = env.login_admin()?;

    for taken in ["alice", "infra", "board"] {
        let err = manager
            .create_account(NewAccount::new(taken, "x@example.org", "Some Body"))
            .unwrap_err();
        assert_eq!(validation_field(err), ValidationField::Uid, "{taken}");
    }
    assert_eq!(manager.gateway().mutation_count(), 0);
    Ok(())
}

/// Tests that only admins may create accounts.
#[test]
fn test_non_admin_create() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let mut manager = env.login("alice", ALICE_PASSWORD)?;

    let err = manager
        .create_account(NewAccount::new("carol", "carol@example.org", "Carol Danvers"))
        .unwrap_err();

    assert!(matches!(err, AccountError::Permission(_)));
    assert_eq!(manager.gateway().mutation_count(), 0);
    Ok(())
}

/// Tests a successful creation end to end.
#[test]
fn test_create_account() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let mut manager = env.login_admin()?;

    let carol = manager.create_account(
        NewAccount::new("carol", "carol@example.org", "Carol Susan Danvers").with_password("captain"),
    )?;
    let account = carol.into_account();

    assert_eq!(account.dn, "uid=carol,ou=people,dc=apache,dc=org");
    assert_eq!(account.uid_number, 6001);
    assert_eq!(account.gid_number, 9000);
    assert_eq!(account.given_name.as_deref(), Some("Carol"));
    assert_eq!(account.surname.as_deref(), Some("Danvers"));
    assert_eq!(account.mail.as_deref(), Some("carol@example.org"));
    assert_eq!(account.committer_email.as_deref(), Some("carol@apache.org"));
    assert_eq!(account.home_directory.as_deref(), Some("/home/carol"));
    assert_eq!(account.login_shell.as_deref(), Some("/bin/bash"));
    assert!(account.has_object_class("ldapPublicKey"));

    let entry = manager
        .gateway()
        .entry(&account.dn)
        .expect("entry was added");
    assert_eq!(entry.get_attr("host"), Some("home.apache.org"));
    assert_eq!(entry.get_attr("asf-sascore"), Some("10"));
    let password = entry.get_attr("userPassword").expect("password is stored");
    assert!(password.starts_with("{CRYPT}$1$"));
    assert!(!password.contains("captain"));
    assert_eq!(manager.gateway().mutation_count(), 1);

    let created = env.audit.events_of(EventType::AccountCreated);
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].actor.as_deref(), Some("root"));
    assert_eq!(created[0].detail("uid_number"), Some("6001"));
    assert!(created[0].details.iter().all(|(_, v)| !v.contains("captain")));
    Ok(())
}

/// Tests single-part names when explicitly allowed.
#[test]
fn test_single_part_name() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let mut manager = env.login_admin()?;

    let account = manager
        .create_account(NewAccount::new("cher", "cher@example.org", "Cher").allow_single_name())?
        .into_account();
    assert_eq!(account.given_name.as_deref(), Some("Cher"));
    assert_eq!(account.surname.as_deref(), Some("Cher"));
    Ok(())
}

/// Tests that consecutive creations fill the lowest gaps in turn.
#[test]
fn test_consecutive_allocation() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let mut manager = env.login_admin()?;

    assert_eq!(manager.next_user_uid()?, 6001);
    manager.create_account(NewAccount::new("carol", "c@example.org", "Carol Danvers"))?;
    assert_eq!(manager.next_user_uid()?, 6004);
    let dave = manager
        .create_account(NewAccount::new("dave", "d@example.org", "Dave Lister"))?
        .into_account();
    assert_eq!(dave.uid_number, 6004);
    Ok(())
}

/// Tests the service band and the snapshot it is drawn from.
#[test]
fn test_service_band() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let mut manager = env.login_admin()?;

    let snapshot = manager.allocation_snapshot()?;
    assert_eq!(snapshot.uids.iter().copied().collect::<Vec<_>>(), vec![6000, 6002, 6003]);
    assert!(snapshot.gids.contains(&9000));
    assert_eq!(manager.next_service_uid()?, 5010);
    Ok(())
}

/// Tests that a failed add reports a directory rejection.
#[test]
fn test_add_rejected() -> anyhow::Result<()> {
    let mut env = TestEnv::new();
    env.directory.fail_next(
        acct_gateway::Operation::Add,
        acct_gateway::GatewayError::InsufficientAccess("uid=carol".into()),
    );
    let mut manager = env.login_admin()?;

    let err = manager
        .create_account(NewAccount::new("carol", "c@example.org", "Carol Danvers"))
        .unwrap_err();
    assert!(matches!(err, AccountError::Directory(_)));
    let created = env.audit.events_of(EventType::AccountCreated);
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].outcome, acct_core::EventOutcome::Failure);
    Ok(())
}
