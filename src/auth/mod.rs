//! Authentication and authorization of update requests.
//!
//! Users are configured up front with an Argon2 password hash and an allow-list of hostnames
//! they may update (see [`store::CredentialStore::load`]). The [`Authenticator`] always runs
//! exactly one hash verification per attempt: unknown usernames are checked against
//! [`verify::DUMMY_PASSWORD_HASH`] so response timing doesn't reveal which users exist.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::fmt;
use std::sync::Arc;

pub mod store;
pub mod verify;

pub use store::{normalize_hostname, CredentialStore, UserConfig, UserRecord};
pub use verify::{Argon2Verifier, HashVerifier, DUMMY_PASSWORD_HASH};

/// Why an authentication attempt failed. Only ever logged, never sent to clients.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("user does not exist")]
    UnknownUser,
    #[error("invalid password")]
    WrongPassword,
    #[error("can't check password: {0}")]
    Verification(String),
}

/// Username and password from an HTTP Basic-Auth header.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

impl Credentials {
    /// Decode `Authorization: Basic <base64(user:pass)>`. The scheme is matched
    /// case-insensitively and the password is everything after the first `:`.
    ///
    /// Returns `None` if the header is missing or malformed.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
        let (scheme, encoded) = value.split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }
        let decoded = String::from_utf8(BASE64.decode(encoded).ok()?).ok()?;
        let (username, password) = decoded.split_once(':')?;
        Some(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

/// Checks credentials against a [`CredentialStore`].
pub struct Authenticator {
    store: CredentialStore,
    verifier: Box<dyn HashVerifier>,
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("users", &self.store.len())
            .finish_non_exhaustive()
    }
}

impl Authenticator {
    /// An authenticator verifying Argon2 hashes.
    #[must_use]
    pub fn new(store: CredentialStore) -> Self {
        Self::with_verifier(store, Argon2Verifier)
    }

    #[must_use]
    pub fn with_verifier(store: CredentialStore, verifier: impl HashVerifier + 'static) -> Self {
        Self {
            store,
            verifier: Box::new(verifier),
        }
    }

    /// Authenticate `username` with `password`, returning the user's record on success.
    ///
    /// # Errors
    ///
    /// Returns the [`AuthFailure`] reason if the user is unknown, the password doesn't match,
    /// or the stored hash couldn't be checked.
    pub fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Arc<UserRecord>, AuthFailure> {
        let user = self.store.get(username);
        let password_hash = user.map_or(DUMMY_PASSWORD_HASH, |u| u.password_hash.as_str());
        let verified = self.verifier.verify(password, password_hash);

        match (user, verified) {
            (None, _) => Err(AuthFailure::UnknownUser),
            (Some(_), Err(err)) => Err(AuthFailure::Verification(err.to_string())),
            (Some(_), Ok(false)) => Err(AuthFailure::WrongPassword),
            (Some(user), Ok(true)) => Ok(Arc::clone(user)),
        }
    }
}
