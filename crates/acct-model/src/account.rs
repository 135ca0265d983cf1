//! Person entries.

use serde::{Deserialize, Serialize};

use crate::entry::DirectoryEntry;
use crate::error::{ModelError, ModelResult};

/// Names of the person-entry attributes the engine reads and writes.
pub mod attr {
    /// Short identifier.
    pub const UID: &str = "uid";
    /// Numeric user id.
    pub const UID_NUMBER: &str = "uidNumber";
    /// Numeric group id.
    pub const GID_NUMBER: &str = "gidNumber";
    /// Full name.
    pub const CN: &str = "cn";
    /// Given name.
    pub const GIVEN_NAME: &str = "givenName";
    /// Surname.
    pub const SURNAME: &str = "sn";
    /// Contact email.
    pub const MAIL: &str = "mail";
    /// Home directory.
    pub const HOME_DIRECTORY: &str = "homeDirectory";
    /// Login shell.
    pub const LOGIN_SHELL: &str = "loginShell";
    /// Object classes.
    pub const OBJECT_CLASS: &str = "objectClass";
    /// Password hash.
    pub const USER_PASSWORD: &str = "userPassword";
    /// Host access list.
    pub const HOST: &str = "host";
    /// Spam-assassin score.
    pub const SASCORE: &str = "asf-sascore";
}

/// A person entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Distinguished Name.
    pub dn: String,
    /// Short identifier.
    pub uid: String,
    /// Numeric user id.
    pub uid_number: u32,
    /// Numeric group id.
    pub gid_number: u32,
    /// Full name (`cn`).
    pub full_name: String,
    /// Given name.
    pub given_name: Option<String>,
    /// Surname.
    pub surname: Option<String>,
    /// Contact email.
    pub mail: Option<String>,
    /// Service-origin email (`<uid>@<domain>`).
    pub committer_email: Option<String>,
    /// Home directory.
    pub home_directory: Option<String>,
    /// Login shell.
    pub login_shell: Option<String>,
    /// Object classes.
    pub object_classes: Vec<String>,
}

impl Account {
    /// Converts a search result into an account.
    ///
    /// `committer_email_attribute` names the attribute holding the
    /// service-origin address, which is deployment specific.
    pub fn from_entry(entry: &DirectoryEntry, committer_email_attribute: &str) -> ModelResult<Self> {
        Ok(Self {
            dn: entry.dn.clone(),
            uid: single(entry, attr::UID)?.to_string(),
            uid_number: number(entry, attr::UID_NUMBER)?,
            gid_number: number(entry, attr::GID_NUMBER)?,
            full_name: single(entry, attr::CN)?.to_string(),
            given_name: entry.get_attr(attr::GIVEN_NAME).map(String::from),
            surname: entry.get_attr(attr::SURNAME).map(String::from),
            mail: entry.get_attr(attr::MAIL).map(String::from),
            committer_email: entry.get_attr(committer_email_attribute).map(String::from),
            home_directory: entry.get_attr(attr::HOME_DIRECTORY).map(String::from),
            login_shell: entry.get_attr(attr::LOGIN_SHELL).map(String::from),
            object_classes: entry.values(attr::OBJECT_CLASS),
        })
    }

    /// Checks whether the account carries an object class.
    #[must_use]
    pub fn has_object_class(&self, class: &str) -> bool {
        self.object_classes
            .iter()
            .any(|c| c.eq_ignore_ascii_case(class))
    }
}

/// Reads an attribute that must have exactly one value.
pub fn single<'a>(entry: &'a DirectoryEntry, attribute: &str) -> ModelResult<&'a str> {
    match entry.get_attrs(attribute).map(Vec::as_slice) {
        None | Some([]) => Err(ModelError::missing(&entry.dn, attribute)),
        Some([value]) => Ok(value.as_str()),
        Some(values) => Err(ModelError::MultipleValues {
            dn: entry.dn.clone(),
            attribute: attribute.to_string(),
            count: values.len(),
        }),
    }
}

/// Reads a single-valued numeric attribute.
pub fn number(entry: &DirectoryEntry, attribute: &str) -> ModelResult<u32> {
    let value = single(entry, attribute)?;
    value.trim().parse().map_err(|_| ModelError::InvalidNumber {
        dn: entry.dn.clone(),
        attribute: attribute.to_string(),
        value: value.to_string(),
    })
}
