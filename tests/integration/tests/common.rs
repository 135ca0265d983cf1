//! Common test utilities and fixtures.

use std::sync::Arc;

use acct_core::{Config, InMemoryAuditSink};
use acct_engine::{AccountManager, AccountResult};
use acct_gateway::InMemoryDirectory;
use acct_model::DirectoryEntry;

pub const PEOPLE: &str = "ou=people,dc=apache,dc=org";
pub const ROOT_DN: &str = "uid=root,ou=people,dc=apache,dc=org";
pub const ALICE_DN: &str = "uid=alice,ou=people,dc=apache,dc=org";
pub const ALICIA_DN: &str = "uid=alicia,ou=people,dc=apache,dc=org";
pub const BOB_DN: &str = "uid=bob,ou=people,dc=apache,dc=org";
pub const APLDAP: &str = "cn=apldap,ou=groups,ou=services,dc=apache,dc=org";
pub const INFRA: &str = "cn=infra,ou=project,ou=groups,dc=apache,dc=org";
pub const INFRA_POSIX: &str = "cn=infra-posix,ou=groups,dc=apache,dc=org";
pub const BOARD: &str = "cn=board,ou=role,ou=groups,dc=apache,dc=org";

pub const ROOT_PASSWORD: &str = "root-secret";
pub const ALICE_PASSWORD: &str = "alice-secret";

/// Test environment holding a seeded directory and an audit sink.
pub struct TestEnv {
    /// Directory handed to each new session.
    pub directory: InMemoryDirectory,
    /// Audit events recorded by every session.
    pub audit: Arc<InMemoryAuditSink>,
}

impl TestEnv {
    /// Creates a new test environment.
    pub fn new() -> Self {
        // Initialize tracing for tests
        let _ = tracing_subscriber::fmt()
            .with_env_filter("acct_engine=debug,acct_gateway=debug")
            .with_test_writer()
            .try_init();

        Self {
            directory: seed_directory(),
            audit: Arc::new(InMemoryAuditSink::new()),
        }
    }

    /// Opens a session as `uid` over a copy of the directory.
    pub fn login(&self, uid: &str, secret: &str) -> AccountResult<AccountManager<InMemoryDirectory>> {
        AccountManager::authenticate_with_audit(
            self.directory.clone(),
            Config::default(),
            uid,
            secret,
            self.audit.clone(),
        )
    }

    /// Opens a session as the account administrator.
    pub fn login_admin(&self) -> AccountResult<AccountManager<InMemoryDirectory>> {
        self.login("root", ROOT_PASSWORD)
    }
}

fn container(dn: &str, class: &str) -> DirectoryEntry {
    DirectoryEntry::new(dn).with("objectClass", class)
}

fn person(uid: &str, full_name: &str, uid_number: u32) -> DirectoryEntry {
    DirectoryEntry::new(format!("uid={uid},{PEOPLE}"))
        .with_values(
            "objectClass",
            ["person", "top", "posixAccount", "inetOrgPerson", "asf-committer"],
        )
        .with("uid", uid)
        .with("cn", full_name)
        .with("mail", format!("{uid}@example.org"))
        .with("uidNumber", uid_number.to_string())
        .with("gidNumber", "9000")
        .with("asf-committer-email", format!("{uid}@apache.org"))
        .with("homeDirectory", format!("/home/{uid}"))
        .with("loginShell", "/bin/bash")
}

/// The production tree in miniature.
///
/// uidNumbers 6000, 6002 and 6003 are taken, so the next user uid is 6001.
pub fn seed_directory() -> InMemoryDirectory {
    InMemoryDirectory::new()
        .with_entry(container("dc=apache,dc=org", "domain"))
        .with_entry(container(PEOPLE, "organizationalUnit"))
        .with_entry(container("ou=groups,dc=apache,dc=org", "organizationalUnit"))
        .with_entry(container("ou=project,ou=groups,dc=apache,dc=org", "organizationalUnit"))
        .with_entry(container("ou=role,ou=groups,dc=apache,dc=org", "organizationalUnit"))
        .with_entry(container("ou=services,dc=apache,dc=org", "organizationalUnit"))
        .with_entry(container("ou=groups,ou=services,dc=apache,dc=org", "organizationalUnit"))
        .with_entry(
            container(APLDAP, "groupOfNames")
                .with("cn", "apldap")
                .with("member", ROOT_DN),
        )
        .with_entry(person("root", "Root Admin", 6000))
        .with_entry(person("alice", "Alice Liddell", 6002))
        .with_entry(person("bob", "Bob Builder", 6003))
        .with_entry(
            container(INFRA, "groupOfNames")
                .with("cn", "infra")
                .with("member", ALICE_DN)
                .with("member", BOB_DN)
                .with("owner", ALICE_DN),
        )
        .with_entry(
            container(INFRA_POSIX, "posixGroup")
                .with("cn", "infra-posix")
                .with("gidNumber", "7000")
                .with("memberUid", "alice")
                .with("memberUid", "bob"),
        )
        .with_entry(
            container(BOARD, "groupOfNames")
                .with("cn", "board")
                .with("member", ALICE_DN),
        )
        .with_credentials(ROOT_DN, ROOT_PASSWORD)
        .with_credentials(ALICE_DN, ALICE_PASSWORD)
}

/// Every `(dn, attribute)` pair holding `value`, ignoring case.
pub fn references_to(directory: &InMemoryDirectory, value: &str) -> Vec<(String, String)> {
    directory
        .entries()
        .flat_map(|entry| {
            entry
                .attributes
                .iter()
                .filter(move |(_, values)| values.iter().any(|v| v.eq_ignore_ascii_case(value)))
                .map(move |(name, _)| (entry.dn.clone(), name.clone()))
        })
        .collect()
}
