//! Configuration for the directory account manager.
//!
//! Configuration is loaded from a TOML file or string. Every section has
//! defaults matching the production directory layout, so a file only needs
//! to name the values it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where entries live in the directory tree.
    pub layout: DirectoryLayout,
    /// Numeric identity bands and gid assignment.
    pub identity: IdentityPolicy,
    /// Attribute template for new accounts.
    pub account: AccountTemplate,
}

impl Config {
    /// Loads and validates configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration back to TOML.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Checks cross-field invariants.
    pub fn validate(&self) -> ConfigResult<()> {
        self.layout.validate()?;
        self.identity.validate()?;
        self.account.validate()
    }
}

// ============================================================================
// Directory Layout
// ============================================================================

/// Base paths of the directory tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryLayout {
    /// Directory suffix; reference sweeps search the whole subtree below it.
    pub suffix: String,
    /// Base DN holding person entries.
    pub people_base: String,
    /// Base DN of posix groups.
    pub groups_base: String,
    /// Base DN of project entries (committers in `member`, PMC in `owner`).
    pub projects_base: String,
    /// Base DN of role entries.
    pub roles_base: String,
    /// DN of the group whose members may create accounts.
    pub admin_group: String,
    /// RDN attribute of person entries.
    pub account_rdn_attribute: String,
}

impl Default for DirectoryLayout {
    fn default() -> Self {
        Self {
            suffix: "dc=apache,dc=org".to_string(),
            people_base: "ou=people,dc=apache,dc=org".to_string(),
            groups_base: "ou=groups,dc=apache,dc=org".to_string(),
            projects_base: "ou=project,ou=groups,dc=apache,dc=org".to_string(),
            roles_base: "ou=role,ou=groups,dc=apache,dc=org".to_string(),
            admin_group: "cn=apldap,ou=groups,ou=services,dc=apache,dc=org".to_string(),
            account_rdn_attribute: "uid".to_string(),
        }
    }
}

impl DirectoryLayout {
    /// Builds the DN of the person entry for a uid.
    #[must_use]
    pub fn account_dn(&self, uid: &str) -> String {
        format!("{}={uid},{}", self.account_rdn_attribute, self.people_base)
    }

    /// Builds the RDN of the person entry for a uid.
    #[must_use]
    pub fn account_rdn(&self, uid: &str) -> String {
        format!("{}={uid}", self.account_rdn_attribute)
    }

    /// Builds `cn=<name>,<base>`.
    #[must_use]
    pub fn group_dn(name: &str, base: &str) -> String {
        format!("cn={name},{base}")
    }

    fn validate(&self) -> ConfigResult<()> {
        let required = [
            ("layout.suffix", &self.suffix),
            ("layout.people_base", &self.people_base),
            ("layout.groups_base", &self.groups_base),
            ("layout.projects_base", &self.projects_base),
            ("layout.roles_base", &self.roles_base),
            ("layout.admin_group", &self.admin_group),
            ("layout.account_rdn_attribute", &self.account_rdn_attribute),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::invalid(format!("{name} cannot be empty")));
            }
        }

        let suffix = self.suffix.to_ascii_lowercase();
        for (name, base) in [
            ("layout.people_base", &self.people_base),
            ("layout.groups_base", &self.groups_base),
            ("layout.projects_base", &self.projects_base),
            ("layout.roles_base", &self.roles_base),
        ] {
            if !base.to_ascii_lowercase().ends_with(&suffix) {
                return Err(ConfigError::invalid(format!(
                    "{name} must be below the directory suffix"
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Identity Policy
// ============================================================================

/// How a gidNumber is chosen for an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GidAssignment {
    /// Every account shares one group id.
    Fixed {
        /// The shared gidNumber.
        gid: u32,
    },
    /// The gidNumber equals the allocated uidNumber.
    MatchUid,
}

impl GidAssignment {
    /// Resolves the gidNumber for a freshly allocated uid.
    #[must_use]
    pub const fn resolve(self, uid_number: u32) -> u32 {
        match self {
            Self::Fixed { gid } => gid,
            Self::MatchUid => uid_number,
        }
    }
}

/// Numeric identity bands.
///
/// User accounts get uids at or above `minimum_user_uid`; service accounts
/// live in `[minimum_service_uid, minimum_user_uid)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityPolicy {
    /// Lowest uid handed to a user account.
    pub minimum_user_uid: u32,
    /// Lowest uid handed to a service account.
    pub minimum_service_uid: u32,
    /// Optional inclusive upper bound for user uids.
    pub maximum_user_uid: Option<u32>,
    /// gid assignment used by account creation.
    pub create_gid: GidAssignment,
    /// gid assignment used by rename.
    pub rename_gid: GidAssignment,
}

impl Default for IdentityPolicy {
    fn default() -> Self {
        Self {
            minimum_user_uid: 6000,
            // 5010 keeps clear of legacy gid 5004.
            minimum_service_uid: 5010,
            maximum_user_uid: None,
            create_gid: GidAssignment::Fixed { gid: 9000 },
            rename_gid: GidAssignment::MatchUid,
        }
    }
}

impl IdentityPolicy {
    /// Inclusive upper bound of the service band.
    #[must_use]
    pub const fn maximum_service_uid(&self) -> u32 {
        self.minimum_user_uid.saturating_sub(1)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.minimum_service_uid >= self.minimum_user_uid {
            return Err(ConfigError::invalid(
                "identity.minimum_service_uid must be below identity.minimum_user_uid",
            ));
        }
        if let Some(max) = self.maximum_user_uid {
            if max < self.minimum_user_uid {
                return Err(ConfigError::invalid(
                    "identity.maximum_user_uid must not be below identity.minimum_user_uid",
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Account Template
// ============================================================================

/// Hash scheme for generated `userPassword` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordScheme {
    /// `{CRYPT}` with MD5-crypt. Weak; kept until the directory's consumers
    /// accept a stronger scheme.
    #[default]
    Md5Crypt,
    /// `{ARGON2}` with an Argon2id PHC string.
    Argon2id,
}

/// Fixed attributes written into every new account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountTemplate {
    /// objectClass values.
    pub object_classes: Vec<String>,
    /// loginShell value.
    pub login_shell: String,
    /// Home directories are `<home_prefix>/<uid>`.
    pub home_prefix: String,
    /// Service-origin addresses are `<uid>@<mail_domain>`.
    pub mail_domain: String,
    /// Attribute holding the service-origin address.
    pub committer_email_attribute: String,
    /// host value.
    pub host: String,
    /// asf-sascore value.
    pub sascore: String,
    /// Hash scheme for the initial password.
    pub password_scheme: PasswordScheme,
    /// Length of generated passwords.
    pub generated_password_length: usize,
}

impl Default for AccountTemplate {
    fn default() -> Self {
        Self {
            object_classes: [
                "person",
                "top",
                "posixAccount",
                "organizationalPerson",
                "inetOrgPerson",
                "asf-committer",
                "hostObject",
                "ldapPublicKey",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            login_shell: "/bin/bash".to_string(),
            home_prefix: "/home".to_string(),
            mail_domain: "apache.org".to_string(),
            committer_email_attribute: "asf-committer-email".to_string(),
            host: "home.apache.org".to_string(),
            sascore: "10".to_string(),
            password_scheme: PasswordScheme::Md5Crypt,
            generated_password_length: 16,
        }
    }
}

impl AccountTemplate {
    /// Home directory for a uid.
    #[must_use]
    pub fn home_directory(&self, uid: &str) -> String {
        format!("{}/{uid}", self.home_prefix.trim_end_matches('/'))
    }

    /// Service-origin email address for a uid.
    #[must_use]
    pub fn committer_email(&self, uid: &str) -> String {
        format!("{uid}@{}", self.mail_domain)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.object_classes.is_empty() {
            return Err(ConfigError::invalid("account.object_classes cannot be empty"));
        }
        if self.mail_domain.trim().is_empty() {
            return Err(ConfigError::invalid("account.mail_domain cannot be empty"));
        }
        if self.generated_password_length < 8 {
            return Err(ConfigError::invalid(
                "account.generated_password_length must be at least 8",
            ));
        }
        Ok(())
    }
}
