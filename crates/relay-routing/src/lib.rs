//! # Relay Routing
//!
//! Picks TURN relay instances for a calling client.
//!
//! Given the caller's identity and address, the router walks a fixed fallback
//! chain:
//! - per-user URL overrides
//! - generic URLs when there is no address or randomization is enabled
//! - geo lookup, then the manual routing table, then the performance table
//! - instance selection with a 2:1 split toward the client's address family
//!
//! Failures past the argument check never escape [`RelayRouter::route`]; they
//! degrade to the generic relay URLs.
//!
//! ## Example
//!
//! ```rust
//! use relay_routing::{
//!     DatacenterRecords, DnsSnapshot, GeoEntry, GeoRoute, PrefixGeoResolver, RelayRouter,
//!     SelectionMode, StaticDnsRecords, StaticRoutingTable, StaticTableSource, TurnConfig,
//!     TurnSettings, UriSet,
//! };
//! use uuid::Uuid;
//!
//! let dns = DnsSnapshot::new().with_datacenter(
//!     "us-east",
//!     DatacenterRecords {
//!         ipv4: vec!["192.0.2.10".parse().unwrap()],
//!         ipv6: vec!["2001:db8::10".parse().unwrap()],
//!     },
//! );
//! let manual = StaticRoutingTable::new(
//!     Vec::new(),
//!     vec![GeoRoute {
//!         continent: "NA".into(),
//!         country: Some("US".into()),
//!         subdivision: None,
//!         datacenters: vec!["us-east".into()],
//!     }],
//! );
//! let geo = PrefixGeoResolver::new(vec![GeoEntry {
//!     prefix: "198.51.100.0/24".parse().unwrap(),
//!     continent: "NA".into(),
//!     country: "US".into(),
//!     subdivision: None,
//! }]);
//! let config = TurnConfig::new(TurnSettings {
//!     hostname: "turn.example.org".into(),
//!     randomize_rate: 0.0,
//!     uri_sets: vec![UriSet {
//!         urls: vec!["turn:turn.example.org".into()],
//!         weight: 1,
//!         enrolled: Vec::new(),
//!     }],
//! });
//!
//! let router = RelayRouter::new(
//!     StaticDnsRecords::new(dns),
//!     StaticTableSource::new(StaticRoutingTable::empty()),
//!     StaticTableSource::new(manual),
//!     config,
//!     geo,
//!     SelectionMode::Stable,
//! );
//!
//! let options = router
//!     .route(&Uuid::new_v4(), Some("198.51.100.7".parse().unwrap()), 3)
//!     .unwrap();
//! assert_eq!(options.resolved_urls.unwrap()[0], "turn:192.0.2.10");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod dns;
pub mod error;
pub mod geo;
pub mod options;
pub mod prefix;
pub mod router;
pub mod select;
pub mod table;
pub mod urls;

pub use config::{RouterConfig, TurnConfig, TurnSettings, UriSet};
pub use dns::{DatacenterRecords, DnsRecordsSource, DnsSnapshot, StaticDnsRecords};
pub use error::{Result, RoutingError};
pub use geo::{
    GeoEntry, GeoError, GeoRecord, GeoResolver, Location, PrefixGeoResolver, Subdivision,
};
pub use options::RelayOptions;
pub use prefix::{IpPrefix, PrefixParseError};
pub use router::RelayRouter;
pub use select::{InstancePicker, Quota, SelectionMode};
pub use table::{
    GeoRoute, RoutingTable, RoutingTableKind, RoutingTableSource, StaticRoutingTable,
    StaticTableSource, SubnetRoute, TableError,
};

/// Default number of relay instances offered per call
pub const DEFAULT_INSTANCE_LIMIT: usize = 3;
