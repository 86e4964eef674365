//! Hetzner DNS API v1 backend.
//!
//! Authenticates with an `Auth-API-Token` header (`DDNS_HETZNER_TOKEN`). Record names are
//! zone relative on this API, so no FQDN building is needed.
//!
//! - List zones: `GET /zones?page=N&per_page=100`
//! - List records: `GET /records?zone_id=:id`
//! - Create / update / delete: `POST /records`, `PUT /records/:id`, `DELETE /records/:id`

use crate::config::require_env;
use crate::error::Error;
use crate::provider::http;
use crate::provider::{
    plan, rrsets, AddressRecord, Change, DynProvider, EnvLookup, ExistingRecord, Provider,
    RecordType, Zone,
};
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const NAME: &str = "hetzner";
const TOKEN_ENV: &str = "DDNS_HETZNER_TOKEN";
const HETZNER_API_BASE: &str = "https://dns.hetzner.com/api/v1";
const AUTH_HEADER: &str = "Auth-API-Token";
const ZONES_PER_PAGE: u32 = 100;

#[derive(Deserialize, Debug)]
struct ZonesResponse {
    #[serde(default)]
    zones: Vec<HetznerZone>,
    meta: Option<Meta>,
}

#[derive(Deserialize, Debug)]
struct HetznerZone {
    id: String,
    name: String,
}

#[derive(Deserialize, Debug)]
struct Meta {
    pagination: Pagination,
}

#[derive(Deserialize, Debug)]
struct Pagination {
    page: u32,
    last_page: u32,
}

#[derive(Deserialize, Debug)]
struct RecordsResponse {
    #[serde(default)]
    records: Vec<HetznerRecord>,
}

#[derive(Deserialize, Debug)]
struct HetznerRecord {
    id: String,
    #[serde(rename = "type")]
    record_type: String,
    name: String,
    value: String,
    ttl: Option<u64>,
}

#[serde_as]
#[derive(Serialize, Debug)]
struct RecordBody<'a> {
    zone_id: &'a str,
    #[serde(rename = "type")]
    record_type: RecordType,
    name: &'a str,
    value: String,
    #[serde_as(as = "DurationSeconds<u64>")]
    ttl: Duration,
}

impl<'a> RecordBody<'a> {
    fn new(zone_id: &'a str, record: &'a AddressRecord) -> Self {
        Self {
            zone_id,
            record_type: record.record_type(),
            name: &record.name,
            value: record.ip.to_string(),
            ttl: record.ttl,
        }
    }
}

#[allow(clippy::module_name_repetitions)]
pub struct HetznerProvider {
    api_token: String,
    client: Client,
    base_url: String,
}

impl fmt::Debug for HetznerProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HetznerProvider")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HetznerProvider {
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client can't be built.
    pub fn new(api_token: impl Into<String>) -> Result<Self, Error> {
        Ok(Self {
            api_token: api_token.into(),
            client: http::client()?,
            base_url: HETZNER_API_BASE.to_string(),
        })
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&RecordBody<'_>>,
        action: &str,
    ) -> Result<reqwest::Response, Error> {
        let mut request = self
            .client
            .request(method, format!("{}{path}", self.base_url))
            .header(AUTH_HEADER, &self.api_token);
        if let Some(body) = body {
            request = request.json(body);
        }
        http::check(NAME, action, request.send().await?).await
    }

    async fn zones(&self, name: Option<&str>) -> Result<Vec<HetznerZone>, Error> {
        let mut zones = Vec::new();
        let mut page = 1;
        loop {
            let mut path = format!("/zones?page={page}&per_page={ZONES_PER_PAGE}");
            if let Some(name) = name {
                path.push_str(&format!("&name={name}"));
            }
            let response: ZonesResponse = self
                .send(Method::GET, &path, None, "list zones")
                .await?
                .json()
                .await?;
            zones.extend(response.zones);
            match response.meta {
                Some(Meta { pagination }) if pagination.page < pagination.last_page => {
                    page = pagination.page + 1;
                }
                _ => return Ok(zones),
            }
        }
    }

    async fn zone_id(&self, zone: &str) -> Result<String, Error> {
        let name = zone.strip_suffix('.').unwrap_or(zone);
        self.zones(Some(name))
            .await?
            .into_iter()
            .find(|z| z.name.eq_ignore_ascii_case(name))
            .map(|z| z.id)
            .ok_or_else(|| Error::provider(NAME, format!("zone \"{name}\" not found")))
    }

    async fn records(&self, zone_id: &str) -> Result<Vec<HetznerRecord>, Error> {
        let response: RecordsResponse = self
            .send(
                Method::GET,
                &format!("/records?zone_id={zone_id}"),
                None,
                "list records",
            )
            .await?
            .json()
            .await?;
        Ok(response.records)
    }

    async fn apply(&self, zone_id: &str, change: &Change<'_>) -> Result<(), Error> {
        match change {
            Change::Create(record) => {
                let body = RecordBody::new(zone_id, record);
                self.send(Method::POST, "/records", Some(&body), "create record")
                    .await?;
            }
            Change::Update { id, record } => {
                let body = RecordBody::new(zone_id, record);
                self.send(
                    Method::PUT,
                    &format!("/records/{id}"),
                    Some(&body),
                    "update record",
                )
                .await?;
            }
            Change::Delete { id } => {
                self.send(Method::DELETE, &format!("/records/{id}"), None, "delete record")
                    .await?;
            }
        }
        Ok(())
    }
}

/// Records of `all` belonging to one RRset.
fn existing_in(all: &[HetznerRecord], name: &str, record_type: RecordType) -> Vec<ExistingRecord> {
    let record_type = record_type.to_string();
    all.iter()
        .filter(|r| r.name.eq_ignore_ascii_case(name) && r.record_type == record_type)
        .map(|r| ExistingRecord {
            id: r.id.clone(),
            content: r.value.clone(),
            ttl: r.ttl.unwrap_or_default(),
        })
        .collect()
}

#[async_trait::async_trait]
impl Provider for HetznerProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn list_zones(&self) -> Result<Vec<Zone>, Error> {
        Ok(self
            .zones(None)
            .await?
            .into_iter()
            .map(|z| Zone::new(z.name))
            .collect())
    }

    async fn set_records(&self, zone: &str, records: &[AddressRecord]) -> Result<(), Error> {
        let zone_id = self.zone_id(zone).await?;
        let all = self.records(&zone_id).await?;
        for set in rrsets(records) {
            let existing = existing_in(&all, set.name, set.record_type);
            let changes = plan(&existing, &set.records);
            tracing::debug!(name = set.name, record_type = %set.record_type, changes = changes.len(), "hetzner rrset plan");
            for change in &changes {
                self.apply(&zone_id, change).await?;
            }
        }
        Ok(())
    }
}

/// Build a [`HetznerProvider`] from `DDNS_HETZNER_TOKEN`.
///
/// # Errors
///
/// Returns [`Error::MissingEnv`] if the token isn't set.
pub fn from_env(env: EnvLookup<'_>) -> Result<DynProvider, Error> {
    let api_token = require_env(env, TOKEN_ENV)?;
    Ok(Arc::new(HetznerProvider::new(api_token)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORDS: &str = r#"{"records": [
        {"id": "1", "type": "A", "name": "home", "value": "198.51.100.1", "ttl": 60, "zone_id": "z"},
        {"id": "2", "type": "AAAA", "name": "home", "value": "2001:db8::1", "zone_id": "z"},
        {"id": "3", "type": "A", "name": "nas", "value": "198.51.100.7", "ttl": 60, "zone_id": "z"},
        {"id": "4", "type": "TXT", "name": "home", "value": "\"v=spf1 -all\"", "zone_id": "z"}
    ]}"#;

    #[test]
    fn selects_rrset_by_name_and_type() {
        let response: RecordsResponse = serde_json::from_str(RECORDS).unwrap();
        let a = existing_in(&response.records, "home", RecordType::A);
        assert_eq!(
            a,
            vec![ExistingRecord {
                id: "1".into(),
                content: "198.51.100.1".into(),
                ttl: 60
            }]
        );
        let aaaa = existing_in(&response.records, "home", RecordType::AAAA);
        assert_eq!(aaaa.len(), 1);
        assert_eq!(aaaa[0].ttl, 0);
    }

    #[test]
    fn parses_zone_pagination() {
        let raw = r#"{"zones": [{"id": "abc", "name": "example.com", "ttl": 86400}],
            "meta": {"pagination": {"page": 1, "per_page": 100, "last_page": 3, "total_entries": 250}}}"#;
        let response: ZonesResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.zones[0].id, "abc");
        let pagination = response.meta.unwrap().pagination;
        assert_eq!((pagination.page, pagination.last_page), (1, 3));
    }

    #[test]
    fn record_body_uses_relative_name() {
        let record = AddressRecord {
            name: "home".into(),
            ip: "198.51.100.1".parse().unwrap(),
            ttl: Duration::from_secs(60),
        };
        let body = serde_json::to_value(RecordBody::new("zone-id", &record)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "zone_id": "zone-id",
                "type": "A",
                "name": "home",
                "value": "198.51.100.1",
                "ttl": 60,
            })
        );
    }

    #[test]
    fn debug_redacts_token() {
        let provider = HetznerProvider::new("hetzner-secret").unwrap();
        assert!(!format!("{provider:?}").contains("hetzner-secret"));
    }
}
