//! DNS-resolved relay instance addresses, grouped by datacenter.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

/// A and AAAA records for one datacenter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatacenterRecords {
    /// IPv4 instance addresses, in resolver order
    #[serde(default)]
    pub ipv4: Vec<Ipv4Addr>,
    /// IPv6 instance addresses, in resolver order
    #[serde(default)]
    pub ipv6: Vec<Ipv6Addr>,
}

/// Immutable view of every datacenter's instance addresses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DnsSnapshot {
    datacenters: HashMap<String, DatacenterRecords>,
}

impl DnsSnapshot {
    /// Create an empty snapshot
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a datacenter's records
    #[must_use]
    pub fn with_datacenter(mut self, id: impl Into<String>, records: DatacenterRecords) -> Self {
        self.datacenters.insert(id.into(), records);
        self
    }

    /// Records for `datacenter`, if known
    #[must_use]
    pub fn get(&self, datacenter: &str) -> Option<&DatacenterRecords> {
        self.datacenters.get(datacenter)
    }

    /// IPv4 addresses for `datacenter`; empty if unknown
    #[must_use]
    pub fn ipv4(&self, datacenter: &str) -> &[Ipv4Addr] {
        self.get(datacenter)
            .map(|r| r.ipv4.as_slice())
            .unwrap_or_default()
    }

    /// IPv6 addresses for `datacenter`; empty if unknown
    #[must_use]
    pub fn ipv6(&self, datacenter: &str) -> &[Ipv6Addr] {
        self.get(datacenter)
            .map(|r| r.ipv6.as_slice())
            .unwrap_or_default()
    }

    /// Known datacenter ids, in no particular order
    pub fn datacenters(&self) -> impl Iterator<Item = &str> {
        self.datacenters.keys().map(String::as_str)
    }

    /// Number of datacenters
    #[must_use]
    pub fn len(&self) -> usize {
        self.datacenters.len()
    }

    /// Whether no datacenter is known
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.datacenters.is_empty()
    }
}

impl FromIterator<(String, DatacenterRecords)> for DnsSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, DatacenterRecords)>>(iter: I) -> Self {
        Self {
            datacenters: iter.into_iter().collect(),
        }
    }
}

/// Supplies the current DNS snapshot
///
/// Called once per routed request; implementations are expected to hand out a
/// cached snapshot rather than resolve anything.
pub trait DnsRecordsSource: Send + Sync {
    /// Current snapshot
    fn snapshot(&self) -> Arc<DnsSnapshot>;
}

impl<F> DnsRecordsSource for F
where
    F: Fn() -> Arc<DnsSnapshot> + Send + Sync,
{
    fn snapshot(&self) -> Arc<DnsSnapshot> {
        self()
    }
}

/// A snapshot that never changes
#[derive(Debug, Clone, Default)]
pub struct StaticDnsRecords {
    snapshot: Arc<DnsSnapshot>,
}

impl StaticDnsRecords {
    /// Wrap `snapshot`
    #[must_use]
    pub fn new(snapshot: DnsSnapshot) -> Self {
        Self {
            snapshot: Arc::new(snapshot),
        }
    }
}

impl DnsRecordsSource for StaticDnsRecords {
    fn snapshot(&self) -> Arc<DnsSnapshot> {
        Arc::clone(&self.snapshot)
    }
}
