//! An in-process implementation of the [`Provider`][super::Provider] trait.
//!
//! Holds a fixed list of zones and their address records in memory. Nothing is persisted or
//! sent anywhere, which makes it a dry-run backend: select it with `DDNS_PROVIDER=memory` and
//! list the zones to accept in `DDNS_MEMORY_ZONES` (comma separated).

use crate::error::Error;
use crate::provider::{rrsets, AddressRecord, DynProvider, EnvLookup, Provider, Zone};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const NAME: &str = "memory";
const ZONES_ENV: &str = "DDNS_MEMORY_ZONES";

#[derive(Debug, Default)]
#[allow(clippy::module_name_repetitions)]
pub struct InMemoryProvider {
    zones: Vec<Zone>,
    records: RwLock<HashMap<String, Vec<AddressRecord>>>,
}

impl InMemoryProvider {
    /// A provider managing `zones`, listed back in the given order.
    pub fn new<I, S>(zones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            zones: zones.into_iter().map(Zone::new).collect(),
            records: RwLock::default(),
        }
    }

    /// Records currently held for `zone`, in insertion order.
    pub async fn records(&self, zone: &str) -> Vec<AddressRecord> {
        self.records
            .read()
            .await
            .get(zone)
            .map_or(Vec::default(), Clone::clone)
    }
}

#[async_trait::async_trait]
impl Provider for InMemoryProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn list_zones(&self) -> Result<Vec<Zone>, Error> {
        Ok(self.zones.clone())
    }

    async fn set_records(&self, zone: &str, records: &[AddressRecord]) -> Result<(), Error> {
        if !self.zones.iter().any(|z| z.name == zone) {
            return Err(Error::provider(NAME, format!("unknown zone \"{zone}\"")));
        }
        let mut store = self.records.write().await;
        let held = store.entry(zone.to_string()).or_default();
        for set in rrsets(records) {
            held.retain(|r| r.name != set.name || r.record_type() != set.record_type);
            held.extend(set.records.into_iter().cloned());
        }
        tracing::debug!(zone, records = held.len(), "memory provider updated");
        Ok(())
    }
}

/// Build an [`InMemoryProvider`] from `DDNS_MEMORY_ZONES`.
///
/// # Errors
///
/// Never fails; an unset variable means no zones.
pub fn from_env(env: EnvLookup<'_>) -> Result<DynProvider, Error> {
    let zones: Vec<String> = env(ZONES_ENV)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|z| !z.is_empty())
        .map(ToString::to_string)
        .collect();
    if zones.is_empty() {
        tracing::warn!("{ZONES_ENV} is empty, every update will fail zone resolution");
    }
    Ok(Arc::new(InMemoryProvider::new(zones)))
}
