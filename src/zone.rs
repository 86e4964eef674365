//! Mapping a hostname onto the provider zone that owns it.

use crate::auth::normalize_hostname;
use crate::error::Error;
use crate::provider::{Provider, Zone};

/// The zone owning a hostname and the hostname's name relative to that zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneMatch {
    /// Zone name exactly as the provider listed it.
    pub zone: String,
    pub record_name: String,
}

/// The part of `hostname` in front of `zone`, if `hostname` is strictly below `zone`.
///
/// Comparison is case-insensitive, ignores one trailing dot on either side and only matches on
/// label boundaries, so `notexample.com` is not below `example.com`. A hostname equal to the
/// zone has no relative name and doesn't match.
#[must_use]
pub fn relative_name(hostname: &str, zone: &str) -> Option<String> {
    let hostname = normalize_hostname(hostname);
    let zone = normalize_hostname(zone);
    if zone.is_empty() {
        return None;
    }
    let prefix = hostname.strip_suffix(zone.as_str())?.strip_suffix('.')?;
    if prefix.is_empty() {
        return None;
    }
    Some(prefix.to_string())
}

/// The first zone, in the given order, that `hostname` is strictly below.
///
/// This is first match, not longest match: with `a.com` listed before `sub.a.com`, the
/// hostname `host.sub.a.com` resolves to `a.com` / `host.sub`.
#[must_use]
pub fn first_match(zones: &[Zone], hostname: &str) -> Option<ZoneMatch> {
    zones.iter().find_map(|zone| {
        relative_name(hostname, &zone.name).map(|record_name| ZoneMatch {
            zone: zone.name.clone(),
            record_name,
        })
    })
}

/// List the provider's zones and pick the one owning `hostname`.
///
/// Zones are listed afresh on every call.
///
/// # Errors
///
/// Returns [`Error::ZoneListing`] if the provider can't list its zones, or
/// [`Error::NoZoneFound`] if no zone owns `hostname`.
pub async fn resolve_zone(provider: &dyn Provider, hostname: &str) -> Result<ZoneMatch, Error> {
    let zones = provider
        .list_zones()
        .await
        .map_err(|err| Error::ZoneListing(Box::new(err)))?;
    first_match(&zones, hostname).ok_or_else(|| Error::NoZoneFound(hostname.to_string()))
}
