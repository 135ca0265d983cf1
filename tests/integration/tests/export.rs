//! LDIF export tests.

use acct_engine::NewAccount;
use acct_gateway::Filter;
use acct_ldif::Base64Policy;

use crate::common::{TestEnv, PEOPLE};

/// Tests plain-text export of one account.
#[test]
fn test_export_account() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let mut manager = env.login_admin()?;

    let ldif = manager.export_ldif(PEOPLE, &Filter::equals("uid", "alice"))?;

    assert!(ldif.starts_with("dn: uid=alice,ou=people,dc=apache,dc=org\n"));
    assert!(ldif.contains("\ncn: Alice Liddell\n"));
    assert!(ldif.contains("\nuidNumber: 6002\n"));
    assert!(!ldif.contains("::"));
    Ok(())
}

/// Tests that non-ASCII values and always-binary attributes are base64.
#[test]
fn test_export_base64_values() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let mut manager = env.login_admin()?;
    manager.create_account(
        NewAccount::new("zoe", "zoe@example.org", "Zoë Smith").with_password("secret"),
    )?;

    let filter = Filter::equals("uid", "zoe");
    let ldif = manager.export_ldif(PEOPLE, &filter)?;
    assert!(ldif.contains("\ngivenName:: Wm/Dqw==\n"));
    assert!(ldif.contains("\nuserPassword: {CRYPT}$1$"));

    let policy = Base64Policy::new().with_attribute("userPassword");
    let ldif = manager.export_ldif_with_policy(PEOPLE, &filter, &policy)?;
    assert!(ldif.contains("\nuserPassword:: "));
    assert!(ldif.contains("\nsn: Smith\n"));
    Ok(())
}

/// Tests that several records are separated by one blank line.
#[test]
fn test_export_many() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let mut manager = env.login_admin()?;

    let ldif = manager.export_ldif(PEOPLE, &Filter::present("uidNumber"))?;
    assert_eq!(ldif.matches("\n\ndn: ").count(), 2);
    assert_eq!(ldif.matches("dn: uid=").count(), 3);
    Ok(())
}
