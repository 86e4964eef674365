//! dyncrab
//!
//! A small dynamic DNS update endpoint speaking the dyndns v3 protocol used by [ddclient],
//! routers and NAS boxes, backed by the API of a hosted DNS provider.
//!
//! Clients authenticate with HTTP Basic-Auth against users configured with an [Argon2]
//! password hash and a per-user allow-list of hostnames. For an accepted update, dyncrab finds
//! the provider zone that owns the hostname and sets the hostname's `A`/`AAAA` records to the
//! given addresses. See [`api`] for the HTTP surface and [`provider`] for the supported
//! backends.
//!
//! Only Argon2 (`argon2id`, `argon2i`, `argon2d`) PHC strings are accepted as password hashes.
//! A user configured with a bcrypt, scrypt or sha-crypt hash can never log in: every attempt
//! gets `401 badauth` and the log says why the hash couldn't be checked. Re-hash such passwords with an
//! Argon2 tool before migrating them.
//!
//! Nothing is persisted: users come from the environment at startup and all DNS state lives at
//! the provider.
//!
//! [ddclient]: https://ddclient.net
//! [Argon2]: https://www.rfc-editor.org/rfc/rfc9106
//!
#![warn(clippy::pedantic)]

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod provider;
pub mod update;
pub mod zone;

pub use api::new as new_http;
pub use auth::{Authenticator, CredentialStore};
pub use config::Config;
pub use error::Error;
pub use provider::{InMemoryProvider, ProviderRegistry};
