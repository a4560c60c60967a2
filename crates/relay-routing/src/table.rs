//! Routing tables mapping client locations to candidate datacenters.
//!
//! Two tables feed the router: an operator-curated manual table, consulted
//! first, and a performance table built from latency measurements. The router
//! only calls [`RoutingTable::lookup`]; how a table is built or refreshed is up
//! to its owner.

use crate::prefix::IpPrefix;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use thiserror::Error;

/// Routing table lookup errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableError {
    /// Table could not be consulted
    #[error("{kind} routing table unavailable: {reason}")]
    Unavailable {
        /// Table that failed
        kind: RoutingTableKind,
        /// Why
        reason: String,
    },

    /// Table answered with data that cannot be used
    #[error("malformed {kind} routing table response: {reason}")]
    Malformed {
        /// Table that failed
        kind: RoutingTableKind,
        /// Why
        reason: String,
    },
}

/// Which routing table a lookup went to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutingTableKind {
    /// Operator-curated overrides
    Manual,
    /// Latency-measured routes
    Performance,
}

impl fmt::Display for RoutingTableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::Performance => write!(f, "performance"),
        }
    }
}

/// Location → ordered datacenter candidates
pub trait RoutingTable: Send + Sync {
    /// Datacenters for a client, best first
    ///
    /// An empty list means the table has no route for this client.
    ///
    /// # Errors
    ///
    /// Returns [`TableError`] if the table cannot answer.
    fn lookup(
        &self,
        addr: IpAddr,
        continent: &str,
        country: &str,
        subdivision: Option<&str>,
    ) -> Result<Vec<String>, TableError>;
}

/// Supplies the current version of a routing table
pub trait RoutingTableSource: Send + Sync {
    /// Current table
    fn table(&self) -> Arc<dyn RoutingTable>;
}

impl<F> RoutingTableSource for F
where
    F: Fn() -> Arc<dyn RoutingTable> + Send + Sync,
{
    fn table(&self) -> Arc<dyn RoutingTable> {
        self()
    }
}

/// A table that never changes
#[derive(Clone)]
pub struct StaticTableSource {
    table: Arc<dyn RoutingTable>,
}

impl StaticTableSource {
    /// Wrap `table`
    #[must_use]
    pub fn new(table: impl RoutingTable + 'static) -> Self {
        Self {
            table: Arc::new(table),
        }
    }
}

impl RoutingTableSource for StaticTableSource {
    fn table(&self) -> Arc<dyn RoutingTable> {
        Arc::clone(&self.table)
    }
}

/// Route for every client inside a network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetRoute {
    /// Client network
    pub prefix: IpPrefix,
    /// Datacenters, best first
    pub datacenters: Vec<String>,
}

/// Route for a geographic area
///
/// Leaving `country` empty makes the route continent-wide; leaving
/// `subdivision` empty makes it country-wide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoRoute {
    /// Continent code
    pub continent: String,
    /// Country code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Subdivision code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdivision: Option<String>,
    /// Datacenters, best first
    pub datacenters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GeoKey {
    continent: String,
    country: Option<String>,
    subdivision: Option<String>,
}

impl GeoKey {
    fn new(continent: &str, country: Option<&str>, subdivision: Option<&str>) -> Self {
        Self {
            continent: continent.to_string(),
            country: country.map(str::to_string),
            subdivision: subdivision.map(str::to_string),
        }
    }
}

/// In-memory routing table
///
/// Lookup order: longest matching subnet, then the most specific geographic
/// route (subdivision, country, continent).
#[derive(Debug, Clone, Default)]
pub struct StaticRoutingTable {
    subnets: Vec<SubnetRoute>,
    geo: HashMap<GeoKey, Vec<String>>,
}

impl StaticRoutingTable {
    /// Build a table from subnet and geographic routes
    ///
    /// A subdivision route without a country is ignored. Later geographic
    /// routes replace earlier ones for the same area.
    #[must_use]
    pub fn new(subnets: Vec<SubnetRoute>, routes: Vec<GeoRoute>) -> Self {
        let mut geo = HashMap::with_capacity(routes.len());
        for route in routes {
            if route.subdivision.is_some() && route.country.is_none() {
                tracing::warn!(
                    "Ignoring route for subdivision {:?} without a country",
                    route.subdivision
                );
                continue;
            }
            let key = GeoKey {
                continent: route.continent,
                country: route.country,
                subdivision: route.subdivision,
            };
            geo.insert(key, route.datacenters);
        }
        Self { subnets, geo }
    }

    /// Table with no routes at all
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of subnet and geographic routes
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.subnets.len() + self.geo.len()
    }

    fn lookup_subnet(&self, addr: &IpAddr) -> Option<&Vec<String>> {
        self.subnets
            .iter()
            .filter(|r| r.prefix.contains(addr))
            .max_by_key(|r| r.prefix.len())
            .map(|r| &r.datacenters)
    }

    fn lookup_geo(
        &self,
        continent: &str,
        country: &str,
        subdivision: Option<&str>,
    ) -> Option<&Vec<String>> {
        let subdivision_hit = subdivision
            .and_then(|sub| self.geo.get(&GeoKey::new(continent, Some(country), Some(sub))));

        subdivision_hit
            .or_else(|| self.geo.get(&GeoKey::new(continent, Some(country), None)))
            .or_else(|| self.geo.get(&GeoKey::new(continent, None, None)))
    }
}

impl RoutingTable for StaticRoutingTable {
    fn lookup(
        &self,
        addr: IpAddr,
        continent: &str,
        country: &str,
        subdivision: Option<&str>,
    ) -> Result<Vec<String>, TableError> {
        Ok(self
            .lookup_subnet(&addr)
            .or_else(|| self.lookup_geo(continent, country, subdivision))
            .cloned()
            .unwrap_or_default())
    }
}
