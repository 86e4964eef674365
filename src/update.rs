//! Pushing address records for a resolved hostname to the provider.

use crate::error::Error;
use crate::provider::{AddressRecord, Provider};
use std::net::IpAddr;
use std::time::Duration;

/// Builds address records with the configured TTL and submits them in one provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateExecutor {
    ttl: Duration,
}

impl UpdateExecutor {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    /// One record named `record_name` per address, in the given order.
    #[must_use]
    pub fn records(&self, record_name: &str, ips: &[IpAddr]) -> Vec<AddressRecord> {
        ips.iter()
            .map(|ip| AddressRecord {
                name: record_name.to_string(),
                ip: *ip,
                ttl: self.ttl,
            })
            .collect()
    }

    /// Set `record_name` in `zone` to exactly `ips` (per address family). Nothing is retried.
    ///
    /// # Errors
    ///
    /// Returns the provider's error unchanged.
    pub async fn apply(
        &self,
        provider: &dyn Provider,
        zone: &str,
        record_name: &str,
        ips: &[IpAddr],
    ) -> Result<Vec<AddressRecord>, Error> {
        let records = self.records(record_name, ips);
        provider.set_records(zone, &records).await?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::InMemoryProvider;

    #[test]
    fn one_record_per_address_with_shared_name_and_ttl() {
        let executor = UpdateExecutor::new(Duration::from_secs(300));
        let ips: Vec<IpAddr> = vec!["198.51.100.1".parse().unwrap(), "2001:db8::1".parse().unwrap()];
        let records = executor.records("home", &ips);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.name == "home" && r.ttl.as_secs() == 300));
        assert_eq!(records[1].ip, ips[1]);
    }

    #[tokio::test]
    async fn apply_sets_records_at_provider() {
        let provider = InMemoryProvider::new(["example.com"]);
        let executor = UpdateExecutor::new(Duration::from_secs(60));
        let ips: Vec<IpAddr> = vec!["198.51.100.1".parse().unwrap()];

        let set = executor
            .apply(&provider, "example.com", "home", &ips)
            .await
            .unwrap();
        assert_eq!(provider.records("example.com").await, set);
    }

    #[tokio::test]
    async fn apply_surfaces_provider_errors() {
        let provider = InMemoryProvider::new(["example.com"]);
        let executor = UpdateExecutor::new(Duration::from_secs(60));
        let ips: Vec<IpAddr> = vec!["198.51.100.1".parse().unwrap()];
        let err = executor
            .apply(&provider, "example.org", "home", &ips)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Provider { .. }));
    }
}
