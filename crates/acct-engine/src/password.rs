//! Initial password generation and `userPassword` hashing.
//!
//! The stored value carries an RFC 2307 scheme prefix so the directory
//! server can verify binds against it:
//!
//! - `{CRYPT}$1$...` MD5-crypt, the format existing consumers accept
//! - `{ARGON2}$argon2id$...` PHC string, for servers with the argon2 module

use acct_core::PasswordScheme;
use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::distr::{Alphanumeric, SampleString};
use rand::Rng;

use crate::error::{AccountError, AccountResult};

/// Generates a random alphanumeric password.
#[must_use]
pub fn generate_password(len: usize) -> String {
    Alphanumeric.sample_string(&mut rand::rng(), len)
}

/// Hashes `password` into a `userPassword` value.
pub fn hash_user_password(password: &str, scheme: PasswordScheme) -> AccountResult<String> {
    match scheme {
        // Legacy scheme kept for existing consumers.
        #[allow(deprecated)]
        PasswordScheme::Md5Crypt => pwhash::md5_crypt::hash(password)
            .map(|hash| format!("{{CRYPT}}{hash}"))
            .map_err(|e| AccountError::internal(format!("md5-crypt failed: {e}"))),
        PasswordScheme::Argon2id => argon2id(password).map(|hash| format!("{{ARGON2}}{hash}")),
    }
}

fn argon2id(password: &str) -> AccountResult<String> {
    let mut salt = [0u8; 16];
    rand::rng().fill(&mut salt[..]);
    let salt = SaltString::encode_b64(&salt)
        .map_err(|e| AccountError::internal(format!("argon2 salt: {e}")))?;

    // OWASP recommended settings for Argon2id
    let params = Params::new(19 * 1024, 2, 1, Some(32))
        .map_err(|e| AccountError::internal(format!("argon2 params: {e}")))?;

    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AccountError::internal(format!("argon2 hash: {e}")))
}
