use crate::error::Error;
use crate::provider::EnvLookup;
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TTL_SECS: u64 = 60;
pub const MIN_TTL_SECS: u64 = 60;
pub const MAX_TTL_SECS: u64 = 86_400;

/// Deadline for all provider work done by one `/v3/update` request.
pub const UPDATE_TIMEOUT: Duration = Duration::from_secs(30);
/// Deadline for the provider zone listing done by `/health` and `/ready`.
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(10);
/// How long shutdown waits for in-flight requests before giving up on them.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

const AUTH_CONFIG_ENV: &str = "DDNS_AUTH_CONFIG";
const PORT_ENV: &str = "DDNS_PORT";
const TTL_ENV: &str = "DDNS_TTL";
const PROVIDER_ENV: &str = "DDNS_PROVIDER";

#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// JSON array of `{username, passwordHash, hostnames}`, see
    /// [`CredentialStore::load`][crate::auth::CredentialStore::load].
    pub auth_config: String,
    pub port: u16,
    pub ttl: Duration,
    /// Name of the [`ProviderRegistry`][crate::provider::ProviderRegistry] entry to use.
    pub provider: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("auth_config", &format_args!("<{} bytes>", self.auth_config.len()))
            .field("port", &self.port)
            .field("ttl", &self.ttl)
            .field("provider", &self.provider)
            .finish()
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`Config::from_lookup`].
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(&|name: &str| std::env::var(name).ok())
    }

    /// Load configuration through `env`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingEnv`] if `DDNS_AUTH_CONFIG` or `DDNS_PROVIDER` is unset,
    /// [`Error::InvalidEnv`] if `DDNS_PORT` or `DDNS_TTL` don't parse, and
    /// [`Error::TtlOutOfRange`] if the TTL is outside 60..=86400 seconds.
    pub fn from_lookup(env: EnvLookup<'_>) -> Result<Self, Error> {
        let auth_config = require_env(env, AUTH_CONFIG_ENV)?;
        let provider = require_env(env, PROVIDER_ENV)?;

        let port = match non_empty(env, PORT_ENV) {
            None => DEFAULT_PORT,
            Some(raw) => raw.parse::<u16>().map_err(|err| Error::InvalidEnv {
                name: PORT_ENV,
                reason: format!("{err}"),
            })?,
        };

        let ttl_secs: u64 = match non_empty(env, TTL_ENV) {
            None => DEFAULT_TTL_SECS,
            Some(raw) => raw.parse().map_err(|err| Error::InvalidEnv {
                name: TTL_ENV,
                reason: format!("{err}"),
            })?,
        };
        if !(MIN_TTL_SECS..=MAX_TTL_SECS).contains(&ttl_secs) {
            return Err(Error::TtlOutOfRange(ttl_secs));
        }

        Ok(Self {
            auth_config,
            port,
            ttl: Duration::from_secs(ttl_secs),
            provider,
        })
    }

    /// Listen on all interfaces at the configured port.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

fn non_empty(env: EnvLookup<'_>, name: &str) -> Option<String> {
    env(name).filter(|v| !v.is_empty())
}

/// Look up a variable that must be set to a non-empty value.
///
/// # Errors
///
/// Returns [`Error::MissingEnv`] naming the variable otherwise.
pub fn require_env(env: EnvLookup<'_>, name: &'static str) -> Result<String, Error> {
    non_empty(env, name).ok_or(Error::MissingEnv(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, Error> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(&|name: &str| vars.get(name).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [("DDNS_AUTH_CONFIG", "[]"), ("DDNS_PROVIDER", "memory")];

    #[test]
    fn defaults() {
        let config = load(&REQUIRED).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.ttl, Duration::from_secs(60));
        assert_eq!(config.provider, "memory");
        assert_eq!(config.bind_addr(), "0.0.0.0:8080".parse().unwrap());
    }

    #[test]
    fn overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([("DDNS_PORT", "9000"), ("DDNS_TTL", "86400")]);
        let config = load(&vars).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.ttl, Duration::from_secs(86_400));
    }

    #[test]
    fn required_variables() {
        assert!(matches!(
            load(&[("DDNS_PROVIDER", "memory")]),
            Err(Error::MissingEnv("DDNS_AUTH_CONFIG"))
        ));
        assert!(matches!(
            load(&[("DDNS_AUTH_CONFIG", "[]"), ("DDNS_PROVIDER", "")]),
            Err(Error::MissingEnv("DDNS_PROVIDER"))
        ));
    }

    #[test]
    fn ttl_bounds() {
        for (raw, ok) in [("59", false), ("60", true), ("3600", true), ("86400", true), ("86401", false)] {
            let mut vars = REQUIRED.to_vec();
            vars.push(("DDNS_TTL", raw));
            assert_eq!(load(&vars).is_ok(), ok, "ttl {raw}");
        }

        let mut vars = REQUIRED.to_vec();
        vars.push(("DDNS_TTL", "0"));
        assert!(matches!(load(&vars), Err(Error::TtlOutOfRange(0))));
    }

    #[test]
    fn unparseable_numbers() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("DDNS_TTL", "sixty"));
        assert!(matches!(load(&vars), Err(Error::InvalidEnv { name: "DDNS_TTL", .. })));

        let mut vars = REQUIRED.to_vec();
        vars.push(("DDNS_PORT", "70000"));
        assert!(matches!(load(&vars), Err(Error::InvalidEnv { name: "DDNS_PORT", .. })));
    }

    #[test]
    fn debug_hides_auth_payload() {
        let mut vars = REQUIRED.to_vec();
        vars[0] = ("DDNS_AUTH_CONFIG", r#"[{"username":"alice","passwordHash":"$argon2id$x","hostnames":[]}]"#);
        let config = load(&vars).unwrap();
        assert!(!format!("{config:?}").contains("argon2id"));
    }
}
