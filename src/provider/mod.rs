//! DNS provider backends.
//!
//! dyncrab never talks DNS itself. It lists the zones a [`Provider`] manages and hands it the
//! address records to set. Backends are picked at startup by name through a
//! [`ProviderRegistry`], so every backend is compiled into the same binary.
//!
//! Four backends are provided: [`cloudflare`], [`desec`], [`hetzner`] and the in-process
//! [`memory`] provider (useful for dry runs). New ones only need a [`Provider`] impl and a
//! registration in [`ProviderRegistry::with_builtin`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

pub mod cloudflare;
pub mod desec;
pub mod hetzner;
mod http;
pub mod memory;
pub mod registry;

pub use memory::InMemoryProvider;
pub use registry::{EnvLookup, ProviderFactory, ProviderRegistry};

/// `DynProvider` is a shared handle to the provider selected at startup.
#[allow(clippy::module_name_repetitions)]
pub type DynProvider = Arc<dyn Provider>;

/// A DNS zone managed by a provider, e.g. `example.com`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Zone {
    pub name: String,
}

impl Zone {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Address record types. Derived from the address family of the record's IP.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordType {
    A,
    AAAA,
}

impl From<&IpAddr> for RecordType {
    fn from(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => Self::A,
            IpAddr::V6(_) => Self::AAAA,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => f.write_str("A"),
            Self::AAAA => f.write_str("AAAA"),
        }
    }
}

/// An `A` or `AAAA` record, named relative to its zone (`host` for `host.example.com` in
/// `example.com`, `@` for the apex).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AddressRecord {
    pub name: String,
    pub ip: IpAddr,
    pub ttl: Duration,
}

impl AddressRecord {
    #[must_use]
    pub fn record_type(&self) -> RecordType {
        RecordType::from(&self.ip)
    }
}

/// Capability interface every DNS backend implements.
///
/// Implementations don't retry; a failed call surfaces as an error for that request. Calls are
/// cancelled by dropping the returned future, which callers do when a request deadline
/// expires.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short identifier used in logs and errors.
    fn name(&self) -> &'static str;

    /// List every zone this provider manages, in the provider's own order.
    async fn list_zones(&self) -> Result<Vec<Zone>, crate::Error>;

    /// Set address records in `zone`.
    ///
    /// For each (name, type) pair present in `records` the zone ends up holding exactly those
    /// records; names and types not mentioned are left alone. Submitting the same state twice
    /// changes nothing.
    async fn set_records(&self, zone: &str, records: &[AddressRecord]) -> Result<(), crate::Error>;
}

/// All records sharing a name and type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RRSet<'a> {
    pub name: &'a str,
    pub record_type: RecordType,
    pub records: Vec<&'a AddressRecord>,
}

/// Group records into RRsets. Duplicate addresses within a set are dropped.
#[must_use]
pub fn rrsets(records: &[AddressRecord]) -> Vec<RRSet<'_>> {
    let mut sets: BTreeMap<(&str, RecordType), Vec<&AddressRecord>> = BTreeMap::new();
    for record in records {
        let set = sets
            .entry((record.name.as_str(), record.record_type()))
            .or_default();
        if !set.iter().any(|r| r.ip == record.ip) {
            set.push(record);
        }
    }
    sets.into_iter()
        .map(|((name, record_type), records)| RRSet {
            name,
            record_type,
            records,
        })
        .collect()
}

/// The fully qualified (no trailing dot) form of a zone relative record name.
#[must_use]
pub fn absolute_name(name: &str, zone: &str) -> String {
    let zone = zone.strip_suffix('.').unwrap_or(zone);
    match name {
        "" | "@" => zone.to_string(),
        _ => format!("{name}.{zone}"),
    }
}

/// A record as it currently exists at a provider, for [`plan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingRecord {
    pub id: String,
    pub content: String,
    pub ttl: u64,
}

/// One API call needed to bring an RRset to its desired state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change<'a> {
    Create(&'a AddressRecord),
    Update { id: String, record: &'a AddressRecord },
    Delete { id: String },
}

/// Work out the changes turning `existing` (one RRset at the provider) into `desired`.
///
/// Records already holding a desired address are kept, and only touched if their TTL differs.
/// Leftover records are rewritten in place before anything is created, and whatever remains
/// after that is deleted.
#[must_use]
pub fn plan<'a>(existing: &[ExistingRecord], desired: &[&'a AddressRecord]) -> Vec<Change<'a>> {
    let mut changes = Vec::new();
    let mut unmatched_existing: Vec<&ExistingRecord> = Vec::new();
    let mut unmatched_desired: Vec<&'a AddressRecord> = desired.to_vec();

    for current in existing {
        let current_ip = current.content.parse::<IpAddr>().ok();
        match unmatched_desired
            .iter()
            .position(|want| Some(want.ip) == current_ip)
        {
            Some(idx) => {
                let want = unmatched_desired.remove(idx);
                if current.ttl != want.ttl.as_secs() {
                    changes.push(Change::Update {
                        id: current.id.clone(),
                        record: want,
                    });
                }
            }
            None => unmatched_existing.push(current),
        }
    }

    let mut reusable = unmatched_existing.into_iter();
    for want in unmatched_desired {
        match reusable.next() {
            Some(current) => changes.push(Change::Update {
                id: current.id.clone(),
                record: want,
            }),
            None => changes.push(Change::Create(want)),
        }
    }
    changes.extend(reusable.map(|current| Change::Delete {
        id: current.id.clone(),
    }));
    changes
}
