//! In-memory credential store built once from the auth configuration payload.

use crate::error::Error;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Normalize a hostname for ACL storage and comparison: lowercase, with one trailing dot
/// stripped.
#[must_use]
pub fn normalize_hostname(hostname: &str) -> String {
    hostname
        .strip_suffix('.')
        .unwrap_or(hostname)
        .to_lowercase()
}

/// One entry of the auth configuration JSON array.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserConfig {
    pub username: String,
    pub password_hash: String,
    #[serde(default)]
    pub hostnames: Vec<String>,
}

/// A configured user: their PHC formatted password hash and the set of normalized hostnames
/// they may update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub username: String,
    pub password_hash: String,
    pub allowed_hosts: HashSet<String>,
}

impl UserRecord {
    /// Whether this user may update `hostname`. The hostname is normalized the same way the
    /// allow-list was at load time and must match an entry exactly.
    #[must_use]
    pub fn is_authorized(&self, hostname: &str) -> bool {
        self.allowed_hosts.contains(&normalize_hostname(hostname))
    }
}

impl From<UserConfig> for UserRecord {
    fn from(user: UserConfig) -> Self {
        Self {
            allowed_hosts: user
                .hostnames
                .iter()
                .map(|h| normalize_hostname(h))
                .collect(),
            username: user.username,
            password_hash: user.password_hash,
        }
    }
}

/// Username to [`UserRecord`] lookup. Read-only once loaded.
#[derive(Debug, Clone, Default)]
#[allow(clippy::module_name_repetitions)]
pub struct CredentialStore {
    users: HashMap<String, Arc<UserRecord>>,
}

impl CredentialStore {
    /// Build a store from the JSON auth configuration payload.
    ///
    /// Later entries for the same username replace earlier ones.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAuthConfig`] if the payload isn't a JSON array of
    /// `{username, passwordHash, hostnames}` objects.
    pub fn load(payload: &str) -> Result<Self, Error> {
        let users: Vec<UserConfig> =
            serde_json::from_str(payload).map_err(Error::InvalidAuthConfig)?;
        Ok(Self::from_users(users))
    }

    #[must_use]
    pub fn from_users(users: impl IntoIterator<Item = UserConfig>) -> Self {
        let mut store = HashMap::new();
        for user in users {
            let record = UserRecord::from(user);
            let mut hostnames: Vec<&String> = record.allowed_hosts.iter().collect();
            hostnames.sort();
            tracing::info!(username = %record.username, ?hostnames, "loaded user");
            store.insert(record.username.clone(), Arc::new(record));
        }
        Self { users: store }
    }

    #[must_use]
    pub fn get(&self, username: &str) -> Option<&Arc<UserRecord>> {
        self.users.get(username)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
