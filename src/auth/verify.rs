//! Password hash verification.

use argon2::password_hash;
use argon2::{Argon2, PasswordHash, PasswordVerifier};

/// Hash verified in place of a real one when the username is unknown, so that unknown users
/// cost the same Argon2 work as known users with a wrong password.
pub const DUMMY_PASSWORD_HASH: &str = "$argon2id$v=19$m=4096,t=3,p=1$WThNMStEazRDM3NVQkIxOXlVaHRaQT09$3XjzaHozsLfjY3ejWY91y7sQ964r49uBsB15PZWVOGw";

/// A hash string couldn't be checked at all (malformed or unsupported scheme).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct VerifyError(pub(crate) String);

/// Checks a cleartext password against a stored, scheme tagged hash string.
pub trait HashVerifier: Send + Sync {
    /// Returns `Ok(true)` on a match, `Ok(false)` on a mismatch.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError`] if `password_hash` can't be parsed or checked.
    fn verify(&self, password: &str, password_hash: &str) -> Result<bool, VerifyError>;
}

/// [`HashVerifier`] for Argon2 (`argon2i`, `argon2d`, `argon2id`) PHC strings. Cost parameters
/// are taken from the hash itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Verifier;

impl HashVerifier for Argon2Verifier {
    fn verify(&self, password: &str, password_hash: &str) -> Result<bool, VerifyError> {
        let parsed = PasswordHash::new(password_hash).map_err(|err| VerifyError(err.to_string()))?;
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(err) => Err(VerifyError(err.to_string())),
        }
    }
}
