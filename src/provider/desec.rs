//! deSEC API v1 backend.
//!
//! Authenticates with a token (`DDNS_DESEC_TOKEN`). deSEC manages RRsets natively, so an update
//! is a single bulk `PATCH /domains/:name/rrsets/` carrying every RRset at once.
//!
//! Note that deSEC enforces a per-domain minimum TTL (3600s unless lowered on request); smaller
//! `DDNS_TTL` values are rejected by the API and surface as provider errors.

use crate::config::require_env;
use crate::error::Error;
use crate::provider::http;
use crate::provider::{rrsets, AddressRecord, DynProvider, EnvLookup, Provider, RecordType, Zone};
use reqwest::Client;
use serde::Serialize;
use serde_with::{serde_as, DurationSeconds};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const NAME: &str = "desec";
const TOKEN_ENV: &str = "DDNS_DESEC_TOKEN";
const DESEC_API_BASE: &str = "https://desec.io/api/v1";

#[serde_as]
#[derive(Serialize, Debug, PartialEq, Eq)]
struct RRSetBody {
    subname: String,
    #[serde(rename = "type")]
    record_type: RecordType,
    #[serde_as(as = "DurationSeconds<u64>")]
    ttl: Duration,
    records: Vec<String>,
}

fn rrset_bodies(records: &[AddressRecord]) -> Vec<RRSetBody> {
    rrsets(records)
        .into_iter()
        .map(|set| RRSetBody {
            subname: match set.name {
                "@" => String::new(),
                name => name.to_string(),
            },
            record_type: set.record_type,
            ttl: set.records.iter().map(|r| r.ttl).max().unwrap_or_default(),
            records: set.records.iter().map(|r| r.ip.to_string()).collect(),
        })
        .collect()
}

#[allow(clippy::module_name_repetitions)]
pub struct DesecProvider {
    token: String,
    client: Client,
    base_url: String,
}

impl fmt::Debug for DesecProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DesecProvider")
            .field("token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl DesecProvider {
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client can't be built.
    pub fn new(token: impl Into<String>) -> Result<Self, Error> {
        Ok(Self {
            token: token.into(),
            client: http::client()?,
            base_url: DESEC_API_BASE.to_string(),
        })
    }

    fn authorization(&self) -> String {
        format!("Token {}", self.token)
    }
}

#[async_trait::async_trait]
impl Provider for DesecProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn list_zones(&self) -> Result<Vec<Zone>, Error> {
        let response = self
            .client
            .get(format!("{}/domains/", self.base_url))
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .send()
            .await?;
        let response = http::check(NAME, "list domains", response).await?;
        Ok(response.json().await?)
    }

    async fn set_records(&self, zone: &str, records: &[AddressRecord]) -> Result<(), Error> {
        let zone = zone.strip_suffix('.').unwrap_or(zone);
        let body = rrset_bodies(records);
        let response = self
            .client
            .patch(format!("{}/domains/{zone}/rrsets/", self.base_url))
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .json(&body)
            .send()
            .await?;
        http::check(NAME, "update rrsets", response).await?;
        Ok(())
    }
}

/// Build a [`DesecProvider`] from `DDNS_DESEC_TOKEN`.
///
/// # Errors
///
/// Returns [`Error::MissingEnv`] if the token isn't set.
pub fn from_env(env: EnvLookup<'_>) -> Result<DynProvider, Error> {
    let token = require_env(env, TOKEN_ENV)?;
    Ok(Arc::new(DesecProvider::new(token)?))
}
