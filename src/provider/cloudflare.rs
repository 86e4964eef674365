//! Cloudflare API v4 backend.
//!
//! Authenticates with an API token (`DDNS_CLOUDFLARE_APITOKEN`) that needs `Zone:Read` and
//! `DNS:Edit` permissions on the zones dyncrab should manage.
//!
//! - List zones: `GET /zones?page=N&per_page=50`
//! - List records: `GET /zones/:zone_id/dns_records?type=A&name=host.example.com`
//! - Create / update / delete: `POST`, `PUT`, `DELETE` on `/zones/:zone_id/dns_records[/:id]`

use crate::config::require_env;
use crate::error::Error;
use crate::provider::http;
use crate::provider::{
    absolute_name, plan, rrsets, AddressRecord, Change, DynProvider, EnvLookup, ExistingRecord,
    Provider, RecordType, Zone,
};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const NAME: &str = "cloudflare";
const TOKEN_ENV: &str = "DDNS_CLOUDFLARE_APITOKEN";
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";
const ZONES_PER_PAGE: u32 = 50;

#[derive(Deserialize, Debug)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
    result_info: Option<ResultInfo>,
}

#[derive(Deserialize, Debug)]
struct ApiMessage {
    code: i64,
    message: String,
}

#[derive(Deserialize, Debug)]
struct ResultInfo {
    page: u32,
    total_pages: u32,
}

#[derive(Deserialize, Debug)]
struct CfZone {
    id: String,
    name: String,
}

#[derive(Deserialize, Debug)]
struct CfRecord {
    id: String,
    content: String,
    ttl: u64,
}

#[serde_as]
#[derive(Serialize, Debug)]
struct RecordBody {
    #[serde(rename = "type")]
    record_type: RecordType,
    name: String,
    content: String,
    #[serde_as(as = "DurationSeconds<u64>")]
    ttl: Duration,
    proxied: bool,
}

impl RecordBody {
    fn new(record: &AddressRecord, zone: &str) -> Self {
        Self {
            record_type: record.record_type(),
            name: absolute_name(&record.name, zone),
            content: record.ip.to_string(),
            ttl: record.ttl,
            proxied: false,
        }
    }
}

#[allow(clippy::module_name_repetitions)]
pub struct CloudflareProvider {
    api_token: String,
    client: Client,
    base_url: String,
}

impl fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl CloudflareProvider {
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client can't be built.
    pub fn new(api_token: impl Into<String>) -> Result<Self, Error> {
        Ok(Self {
            api_token: api_token.into(),
            client: http::client()?,
            base_url: CLOUDFLARE_API_BASE.to_string(),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&RecordBody>,
        action: &str,
    ) -> Result<Envelope<T>, Error> {
        let mut request = self
            .client
            .request(method, format!("{}{path}", self.base_url))
            .bearer_auth(&self.api_token);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = http::check(NAME, action, request.send().await?).await?;
        let envelope: Envelope<T> = response.json().await?;
        if !envelope.success {
            let errors: Vec<String> = envelope
                .errors
                .iter()
                .map(|e| format!("{} ({})", e.message, e.code))
                .collect();
            return Err(Error::provider(NAME, format!("{action}: {}", errors.join(", "))));
        }
        Ok(envelope)
    }

    async fn zones(&self) -> Result<Vec<CfZone>, Error> {
        let mut zones = Vec::new();
        let mut page = 1;
        loop {
            let path = format!("/zones?page={page}&per_page={ZONES_PER_PAGE}");
            let envelope: Envelope<Vec<CfZone>> =
                self.call(Method::GET, &path, None, "list zones").await?;
            zones.extend(envelope.result.unwrap_or_default());
            match envelope.result_info {
                Some(info) if info.page < info.total_pages => page = info.page + 1,
                _ => return Ok(zones),
            }
        }
    }

    async fn zone_id(&self, zone: &str) -> Result<String, Error> {
        let name = zone.strip_suffix('.').unwrap_or(zone);
        let envelope: Envelope<Vec<CfZone>> = self
            .call(Method::GET, &format!("/zones?name={name}"), None, "look up zone")
            .await?;
        envelope
            .result
            .unwrap_or_default()
            .into_iter()
            .find(|z| z.name.eq_ignore_ascii_case(name))
            .map(|z| z.id)
            .ok_or_else(|| Error::provider(NAME, format!("zone \"{name}\" not found")))
    }

    async fn existing(
        &self,
        zone_id: &str,
        fqdn: &str,
        record_type: RecordType,
    ) -> Result<Vec<ExistingRecord>, Error> {
        let path = format!("/zones/{zone_id}/dns_records?type={record_type}&name={fqdn}");
        let envelope: Envelope<Vec<CfRecord>> =
            self.call(Method::GET, &path, None, "list records").await?;
        Ok(envelope
            .result
            .unwrap_or_default()
            .into_iter()
            .map(|r| ExistingRecord {
                id: r.id,
                content: r.content,
                ttl: r.ttl,
            })
            .collect())
    }

    async fn apply(&self, zone_id: &str, zone: &str, change: &Change<'_>) -> Result<(), Error> {
        let records = format!("/zones/{zone_id}/dns_records");
        match change {
            Change::Create(record) => {
                let body = RecordBody::new(record, zone);
                self.call::<serde_json::Value>(Method::POST, &records, Some(&body), "create record")
                    .await?;
            }
            Change::Update { id, record } => {
                let body = RecordBody::new(record, zone);
                self.call::<serde_json::Value>(
                    Method::PUT,
                    &format!("{records}/{id}"),
                    Some(&body),
                    "update record",
                )
                .await?;
            }
            Change::Delete { id } => {
                self.call::<serde_json::Value>(
                    Method::DELETE,
                    &format!("{records}/{id}"),
                    None,
                    "delete record",
                )
                .await?;
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Provider for CloudflareProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn list_zones(&self) -> Result<Vec<Zone>, Error> {
        Ok(self
            .zones()
            .await?
            .into_iter()
            .map(|z| Zone::new(z.name))
            .collect())
    }

    async fn set_records(&self, zone: &str, records: &[AddressRecord]) -> Result<(), Error> {
        let zone_id = self.zone_id(zone).await?;
        for set in rrsets(records) {
            let fqdn = absolute_name(set.name, zone);
            let existing = self.existing(&zone_id, &fqdn, set.record_type).await?;
            let changes = plan(&existing, &set.records);
            tracing::debug!(%fqdn, record_type = %set.record_type, changes = changes.len(), "cloudflare rrset plan");
            for change in &changes {
                self.apply(&zone_id, zone, change).await?;
            }
        }
        Ok(())
    }
}

/// Build a [`CloudflareProvider`] from `DDNS_CLOUDFLARE_APITOKEN`.
///
/// # Errors
///
/// Returns [`Error::MissingEnv`] if the token isn't set.
pub fn from_env(env: EnvLookup<'_>) -> Result<DynProvider, Error> {
    let api_token = require_env(env, TOKEN_ENV)?;
    Ok(Arc::new(CloudflareProvider::new(api_token)?))
}
