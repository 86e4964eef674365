//! Error types.

use crate::auth::AuthFailure;
use std::time::Duration;

/// Error enumerates the possible dyncrab error states.
///
/// Only the fixed dyndns wire vocabulary is ever shown to HTTP clients (see
/// [`crate::api`]), the `Display` text of these variants is for operators and logs.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Returned at startup when a required environment variable is unset or empty.
    #[error("{0} environment variable is required")]
    MissingEnv(&'static str),

    /// Returned at startup when an environment variable can't be parsed.
    #[error("can't parse {name} environment variable: {reason}")]
    InvalidEnv { name: &'static str, reason: String },

    /// Returned at startup when the configured record TTL is outside of
    /// [`MIN_TTL_SECS`][crate::config::MIN_TTL_SECS]..=[`MAX_TTL_SECS`][crate::config::MAX_TTL_SECS].
    #[error("DDNS_TTL must be between 60 and 86400 seconds, got {0}")]
    TtlOutOfRange(u64),

    /// Returned when the auth configuration payload isn't a well-formed JSON array of users.
    #[error("failed to parse auth configuration: {0}")]
    InvalidAuthConfig(#[source] serde_json::Error),

    /// Returned when the selected provider name has no registered factory.
    #[error("unknown DNS provider \"{0}\"")]
    UnknownProvider(String),

    /// Returned when an update request carries no usable HTTP Basic-Auth credentials.
    #[error("can't decode username and password from Basic-Auth. No credentials?")]
    MissingCredentials,

    /// Returned when the presented credentials don't authenticate. The `reason` is only ever
    /// logged, clients get a generic `badauth`.
    #[error("auth failed for \"{username}\": {reason}")]
    AuthFailed {
        username: String,
        reason: AuthFailure,
    },

    /// Returned when an authenticated user tries to update a hostname that isn't on their
    /// allow-list.
    #[error("access denied: \"{username}\" is not allowed to update \"{hostname}\"")]
    HostForbidden { username: String, hostname: String },

    /// Returned when the `hostname` query parameter is missing or empty.
    #[error("no hostname provided")]
    NotFqdn,

    /// Returned when the `myip` query parameter is missing or empty.
    #[error("no ip address provided")]
    MissingAddress,

    /// Returned when one of the comma separated `myip` values isn't an IP address.
    #[error("unable to parse ip address \"{0}\"")]
    InvalidAddress(String),

    /// Returned when every `myip` value was an unspecified address (`0.0.0.0`, `::`).
    #[error("no specified ip address given in \"{0}\"")]
    NoSpecifiedAddress(String),

    /// Returned when none of the provider's zones owns the requested hostname.
    #[error("can't find zone from hostname {0}")]
    NoZoneFound(String),

    /// Returned when the provider's zones couldn't be listed while resolving a hostname.
    #[error("failed to list zones: {0}")]
    ZoneListing(#[source] Box<Error>),

    /// Returned by [`Provider`][crate::provider::Provider] implementations when the backend
    /// API rejects or fails a call.
    #[error("provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    /// Returned when a provider call doesn't finish inside the request's deadline.
    #[error("provider call timed out after {0:?}")]
    Timeout(Duration),

    /// Returned when a provider HTTP call fails at the transport level.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Create a provider error for the named backend.
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}
