//! Geo resolution of client addresses.
//!
//! The router only consumes [`GeoResolver`]; [`PrefixGeoResolver`] is a
//! longest-prefix-match table for deployments and tests that do not carry a
//! full geo-IP database.

use crate::prefix::IpPrefix;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use thiserror::Error;

/// Geo lookup errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeoError {
    /// No entry covers the address
    #[error("no geo entry for {0}")]
    NotFound(IpAddr),

    /// Entry exists but is missing required fields
    #[error("malformed geo entry for {addr}: {reason}")]
    Malformed {
        /// Address being resolved
        addr: IpAddr,
        /// What was wrong with the entry
        reason: String,
    },
}

/// First-level administrative subdivision (state, province)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subdivision {
    /// ISO 3166-2 subdivision code without the country prefix
    pub iso_code: String,
}

/// Raw answer from a geo resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoRecord {
    /// Two-letter continent code
    pub continent: String,
    /// ISO 3166-1 country code
    pub country: String,
    /// Subdivisions, most significant first
    #[serde(default)]
    pub subdivisions: Vec<Subdivision>,
}

/// Maps a client address to where it is
pub trait GeoResolver: Send + Sync {
    /// Resolve `addr`
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] when the address is unknown or its entry is unusable.
    fn resolve(&self, addr: IpAddr) -> Result<GeoRecord, GeoError>;
}

impl<F> GeoResolver for F
where
    F: Fn(IpAddr) -> Result<GeoRecord, GeoError> + Send + Sync,
{
    fn resolve(&self, addr: IpAddr) -> Result<GeoRecord, GeoError> {
        self(addr)
    }
}

/// Location descriptor used to query routing tables
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    /// Continent code
    pub continent: String,
    /// Country code
    pub country: String,
    /// First subdivision code, if the resolver returned any
    pub subdivision: Option<String>,
}

impl Location {
    /// Build a location from a resolver record, keeping only the first subdivision
    #[must_use]
    pub fn from_record(record: GeoRecord) -> Self {
        let subdivision = record.subdivisions.into_iter().next().map(|s| s.iso_code);
        Self {
            continent: record.continent,
            country: record.country,
            subdivision,
        }
    }
}

/// One row of a [`PrefixGeoResolver`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoEntry {
    /// Network the row covers
    pub prefix: IpPrefix,
    /// Continent code
    pub continent: String,
    /// Country code
    pub country: String,
    /// Optional subdivision code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdivision: Option<String>,
}

/// Longest-prefix-match geo table
#[derive(Debug, Clone, Default)]
pub struct PrefixGeoResolver {
    entries: Vec<GeoEntry>,
}

impl PrefixGeoResolver {
    /// Create a resolver over `entries`
    #[must_use]
    pub fn new(entries: Vec<GeoEntry>) -> Self {
        Self { entries }
    }

    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl GeoResolver for PrefixGeoResolver {
    fn resolve(&self, addr: IpAddr) -> Result<GeoRecord, GeoError> {
        let addr = addr.to_canonical();
        let entry = self
            .entries
            .iter()
            .filter(|e| e.prefix.contains(&addr))
            .max_by_key(|e| e.prefix.len())
            .ok_or(GeoError::NotFound(addr))?;

        if entry.continent.is_empty() || entry.country.is_empty() {
            return Err(GeoError::Malformed {
                addr,
                reason: "missing continent or country".to_string(),
            });
        }

        Ok(GeoRecord {
            continent: entry.continent.clone(),
            country: entry.country.clone(),
            subdivisions: entry
                .subdivision
                .iter()
                .map(|code| Subdivision {
                    iso_code: code.clone(),
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(prefix: &str, continent: &str, country: &str, sub: Option<&str>) -> GeoEntry {
        GeoEntry {
            prefix: prefix.parse().unwrap(),
            continent: continent.to_string(),
            country: country.to_string(),
            subdivision: sub.map(str::to_string),
        }
    }

    #[test]
    fn test_location_takes_first_subdivision() {
        let record = GeoRecord {
            continent: "NA".into(),
            country: "US".into(),
            subdivisions: vec![
                Subdivision { iso_code: "VA".into() },
                Subdivision { iso_code: "XX".into() },
            ],
        };
        let location = Location::from_record(record);
        assert_eq!(location.subdivision.as_deref(), Some("VA"));
    }

    #[test]
    fn test_location_without_subdivision() {
        let record = GeoRecord {
            continent: "EU".into(),
            country: "DE".into(),
            subdivisions: Vec::new(),
        };
        assert_eq!(Location::from_record(record).subdivision, None);
    }

    #[test]
    fn test_longest_prefix_wins() {
        let resolver = PrefixGeoResolver::new(vec![
            entry("10.0.0.0/8", "NA", "US", None),
            entry("10.1.0.0/16", "NA", "US", Some("VA")),
        ]);

        let record = resolver.resolve("10.1.2.3".parse().unwrap()).unwrap();
        assert_eq!(record.subdivisions[0].iso_code, "VA");

        let record = resolver.resolve("10.2.0.1".parse().unwrap()).unwrap();
        assert!(record.subdivisions.is_empty());
    }

    #[test]
    fn test_mapped_ipv4_matches_ipv4_prefix() {
        let resolver = PrefixGeoResolver::new(vec![entry("1.0.0.0/8", "OC", "AU", None)]);
        let record = resolver.resolve("::ffff:1.2.3.4".parse().unwrap()).unwrap();
        assert_eq!(record.country, "AU");
    }

    #[test]
    fn test_unknown_address() {
        let resolver = PrefixGeoResolver::new(vec![entry("10.0.0.0/8", "NA", "US", None)]);
        let addr: IpAddr = "192.0.2.1".parse().unwrap();
        assert_eq!(resolver.resolve(addr), Err(GeoError::NotFound(addr)));
    }

    #[test]
    fn test_malformed_entry() {
        let resolver = PrefixGeoResolver::new(vec![entry("10.0.0.0/8", "", "US", None)]);
        assert!(matches!(
            resolver.resolve("10.0.0.1".parse().unwrap()),
            Err(GeoError::Malformed { .. })
        ));
    }

    #[test]
    fn test_closure_resolver() {
        let resolver =
            |addr: IpAddr| -> Result<GeoRecord, GeoError> { Err(GeoError::NotFound(addr)) };
        assert!(resolver.resolve("::1".parse().unwrap()).is_err());
    }
}
