//! Fixtures shared by the routing integration and property tests.

use relay_routing::{
    DatacenterRecords, DnsSnapshot, GeoError, GeoRecord, RelayRouter, RoutingTable,
    SelectionMode, StaticTableSource, Subdivision, TableError, TurnConfig,
    TurnSettings, UriSet,
};
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

/// Hostname every fixture router reports
pub const HOSTNAME: &str = "turn.example.org";

/// Generic URLs covering UDP, TCP and TLS
pub fn generic_urls() -> Vec<String> {
    vec![
        format!("turn:{HOSTNAME}"),
        format!("turn:{HOSTNAME}:80?transport=tcp"),
        format!("turns:{HOSTNAME}:443?transport=tcp"),
    ]
}

/// Build a snapshot from `(datacenter, ipv4, ipv6)` rows
pub fn snapshot(rows: &[(&str, &[&str], &[&str])]) -> DnsSnapshot {
    rows.iter()
        .map(|(dc, v4, v6)| {
            (
                (*dc).to_string(),
                DatacenterRecords {
                    ipv4: v4.iter().map(|a| a.parse().unwrap()).collect(),
                    ipv6: v6.iter().map(|a| a.parse().unwrap()).collect(),
                },
            )
        })
        .collect()
}

/// TURN config with one generic set and one set pinned to `enrolled`
pub fn turn_config(enrolled: Vec<Uuid>, randomize_rate: f64) -> TurnConfig {
    TurnConfig::new(TurnSettings {
        hostname: HOSTNAME.to_string(),
        randomize_rate,
        uri_sets: vec![
            UriSet {
                urls: generic_urls(),
                weight: 1,
                enrolled: Vec::new(),
            },
            UriSet {
                urls: vec!["turn:pinned.example.org".to_string()],
                weight: 0,
                enrolled,
            },
        ],
    })
}

/// Call counters for the fixture collaborators
#[derive(Debug, Default, Clone)]
pub struct CallCounts {
    /// Geo resolutions
    pub geo: Arc<AtomicUsize>,
    /// DNS snapshot fetches
    pub dns: Arc<AtomicUsize>,
    /// Routing table lookups, both tables
    pub tables: Arc<AtomicUsize>,
}

impl CallCounts {
    /// Total collaborator calls besides configuration reads
    pub fn total(&self) -> usize {
        self.geo.load(Ordering::SeqCst)
            + self.dns.load(Ordering::SeqCst)
            + self.tables.load(Ordering::SeqCst)
    }
}

/// Routing table with a fixed answer
pub struct FixedTable {
    answer: Result<Vec<String>, TableError>,
    calls: Arc<AtomicUsize>,
}

impl RoutingTable for FixedTable {
    fn lookup(
        &self,
        _addr: IpAddr,
        _continent: &str,
        _country: &str,
        _subdivision: Option<&str>,
    ) -> Result<Vec<String>, TableError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }
}

/// Inputs for [`fixture_router`]
pub struct Fixture {
    /// DNS records
    pub dns: DnsSnapshot,
    /// Manual table answer
    pub manual: Result<Vec<String>, TableError>,
    /// Performance table answer
    pub performance: Result<Vec<String>, TableError>,
    /// Geo answer for every address
    pub geo: Result<GeoRecord, GeoError>,
    /// Router configuration
    pub config: TurnConfig,
    /// Instance selection mode
    pub mode: SelectionMode,
}

impl Fixture {
    /// Fixture routing every client to `datacenters` through the manual table
    pub fn manual(dns: DnsSnapshot, datacenters: &[&str]) -> Self {
        Self {
            dns,
            manual: Ok(datacenters.iter().map(|s| (*s).to_string()).collect()),
            performance: Ok(Vec::new()),
            geo: Ok(record("NA", "US", Some("VA"))),
            config: turn_config(Vec::new(), 0.0),
            mode: SelectionMode::Stable,
        }
    }
}

/// Geo record with an optional subdivision
pub fn record(continent: &str, country: &str, subdivision: Option<&str>) -> GeoRecord {
    GeoRecord {
        continent: continent.to_string(),
        country: country.to_string(),
        subdivisions: subdivision
            .map(|code| {
                vec![Subdivision {
                    iso_code: code.to_string(),
                }]
            })
            .unwrap_or_default(),
    }
}

/// Router over fixed collaborators, plus counters for how often each is called
pub fn fixture_router(fixture: Fixture) -> (RelayRouter, CallCounts) {
    let counts = CallCounts::default();

    let snapshot = Arc::new(fixture.dns);
    let dns_calls = Arc::clone(&counts.dns);
    let dns = move || {
        dns_calls.fetch_add(1, Ordering::SeqCst);
        Arc::clone(&snapshot)
    };

    let geo_answer = fixture.geo;
    let geo_calls = Arc::clone(&counts.geo);
    let geo = move |_addr: IpAddr| {
        geo_calls.fetch_add(1, Ordering::SeqCst);
        geo_answer.clone()
    };

    let manual = StaticTableSource::new(FixedTable {
        answer: fixture.manual,
        calls: Arc::clone(&counts.tables),
    });
    let performance = StaticTableSource::new(FixedTable {
        answer: fixture.performance,
        calls: Arc::clone(&counts.tables),
    });

    let router = RelayRouter::new(dns, performance, manual, fixture.config, geo, fixture.mode);
    (router, counts)
}

/// Router that sends every client to `datacenters`
pub fn manual_router(dns: DnsSnapshot, datacenters: &[&str], mode: SelectionMode) -> RelayRouter {
    let mut fixture = Fixture::manual(dns, datacenters);
    fixture.mode = mode;
    fixture_router(fixture).0
}
