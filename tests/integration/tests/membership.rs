//! Membership mutation tests.

use acct_core::{EventOutcome, EventType};
use acct_engine::AccountError;
use acct_gateway::GatewayError;
use acct_model::MembershipCategory;

use crate::common::{TestEnv, BOARD, BOB_DN, INFRA, INFRA_POSIX};

/// Tests one add and one remove per category.
#[test]
fn test_membership_per_category() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let mut manager = env.login_admin()?;

    let mut bob = manager.load_account("bob")?.expect("bob is seeded");
    bob.add_pmc("infra")?;
    bob.add_role("board")?;
    bob.remove_project("infra")?;
    bob.remove_basic_group("infra-posix")?;
    drop(bob);

    assert_eq!(manager.gateway().mutation_count(), 4);
    let infra = manager.load_project("infra")?.expect("seeded");
    assert!(infra.owners.iter().any(|dn| dn == BOB_DN));
    assert!(!infra.members.iter().any(|dn| dn == BOB_DN));
    let board = manager.load_role("board")?.expect("seeded");
    assert!(board.members.iter().any(|dn| dn == BOB_DN));
    let posix = manager.load_posix_group("infra-posix")?.expect("seeded");
    assert!(!posix.has_member("bob"));
    assert_eq!(posix.gid_number, Some(7000));

    let added = env.audit.events_of(EventType::MembershipAdded);
    assert_eq!(added.len(), 2);
    assert_eq!(added[0].detail("group"), Some(INFRA));
    assert_eq!(added[1].detail("group"), Some(BOARD));
    let removed = env.audit.events_of(EventType::MembershipRemoved);
    assert_eq!(removed.len(), 2);
    assert_eq!(removed[1].detail("group"), Some(INFRA_POSIX));
    Ok(())
}

/// Tests the category to attribute mapping through the generic calls.
#[test]
fn test_generic_membership_calls() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let mut manager = env.login_admin()?;

    let mut root = manager.load_account("root")?.expect("root is seeded");
    for category in MembershipCategory::ALL {
        let name = match category {
            MembershipCategory::Project | MembershipCategory::Pmc => "infra",
            MembershipCategory::BasicGroup => "infra-posix",
            MembershipCategory::Role => "board",
        };
        root.add_membership(category, name)?;
    }
    let root_dn = root.dn().to_string();
    drop(root);

    let infra = manager.gateway().entry(INFRA).expect("seeded");
    assert!(infra.find_value("member", &root_dn).is_some());
    assert!(infra.find_value("owner", &root_dn).is_some());
    let posix = manager.gateway().entry(INFRA_POSIX).expect("seeded");
    assert!(posix.find_value("memberUid", "root").is_some());
    Ok(())
}

/// Tests that directory refusals surface per call.
#[test]
fn test_membership_rejections() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let mut manager = env.login_admin()?;
    let mut bob = manager.load_account("bob")?.expect("bob is seeded");

    let err = bob.add_project("infra").unwrap_err();
    assert!(matches!(err, AccountError::Directory(GatewayError::ValueExists { .. })));
    let err = bob.remove_role("board").unwrap_err();
    assert!(matches!(err, AccountError::Directory(GatewayError::NoSuchValue { .. })));
    let err = bob.add_project("no-such-project").unwrap_err();
    assert!(matches!(err, AccountError::Directory(GatewayError::NoSuchObject(_))));
    drop(bob);

    assert_eq!(manager.gateway().mutation_count(), 0);
    let failures = env
        .audit
        .events()
        .into_iter()
        .filter(|e| e.outcome == EventOutcome::Failure)
        .count();
    assert_eq!(failures, 3);
    Ok(())
}
