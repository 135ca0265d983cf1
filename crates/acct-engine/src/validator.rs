//! Stateless input rules for account creation and rename.
//!
//! Collision checks need the directory and live on the manager; everything
//! here is pure.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AccountError, AccountResult, ValidationField};

/// Account identifiers: lowercase alphanumerics and underscores, no dashes,
/// at least two characters.
static UID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9_]+$").expect("UID_REGEX is a valid regex pattern")
});

/// Session login identifiers, which predate the no-dash rule.
static LOGIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-_a-z0-9]+$").expect("LOGIN_REGEX is a valid regex pattern")
});

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\S+@\S+?\.\S+$").expect("EMAIL_REGEX is a valid regex pattern")
});

/// Given name and surname extracted from a full name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameParts {
    /// First space-separated part.
    pub given_name: String,
    /// Last space-separated part.
    pub surname: String,
}

/// Checks account identifier syntax.
pub fn validate_uid(uid: &str) -> AccountResult<()> {
    if UID_REGEX.is_match(uid) {
        Ok(())
    } else {
        Err(AccountError::validation(
            ValidationField::Uid,
            format!("{uid:?} must match ^[a-z0-9][a-z0-9_]+$"),
        ))
    }
}

/// Checks login identifier syntax.
#[must_use]
pub fn is_valid_login(uid: &str) -> bool {
    LOGIN_REGEX.is_match(uid)
}

/// Splits a full name on single spaces.
///
/// At least two parts are required unless `require_two_parts` is false.
/// Any empty or whitespace-only part (from doubled, leading or trailing
/// spaces) is rejected.
pub fn split_full_name(full_name: &str, require_two_parts: bool) -> AccountResult<NameParts> {
    let parts: Vec<&str> = full_name.split(' ').collect();
    if parts.len() < 2 && require_two_parts {
        return Err(AccountError::validation(
            ValidationField::FullName,
            "full name needs at least two parts",
        ));
    }
    if parts.iter().any(|part| part.trim().is_empty()) {
        return Err(AccountError::validation(
            ValidationField::FullName,
            "found part of name with too much spacing",
        ));
    }
    // split always yields at least one item
    let given_name = parts.first().copied().unwrap_or_default();
    let surname = parts.last().copied().unwrap_or_default();
    Ok(NameParts {
        given_name: given_name.to_string(),
        surname: surname.to_string(),
    })
}

/// Checks the minimal `local@domain.tld` email shape.
pub fn validate_email(email: &str) -> AccountResult<()> {
    if EMAIL_REGEX.is_match(email) {
        Ok(())
    } else {
        Err(AccountError::validation(
            ValidationField::Email,
            format!("{email:?} is not a valid address"),
        ))
    }
}
