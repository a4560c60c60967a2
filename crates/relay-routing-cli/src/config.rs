//! Configuration file for the relay-route CLI.

use relay_routing::{
    DnsSnapshot, GeoEntry, GeoRoute, PrefixGeoResolver, RelayRouter, SelectionMode,
    StaticDnsRecords, StaticRoutingTable, StaticTableSource, SubnetRoute, TurnConfig,
    TurnSettings, UriSet,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// relay-route configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Router behavior
    #[serde(default)]
    pub router: RouterSection,
    /// Hostname, URL sets and randomization
    #[serde(default = "default_turn")]
    pub turn: TurnSettings,
    /// Instance addresses per datacenter
    #[serde(default)]
    pub dns: DnsSnapshot,
    /// Operator-curated routes
    #[serde(default)]
    pub manual: TableConfig,
    /// Measured routes
    #[serde(default)]
    pub performance: TableConfig,
    /// Geo prefix table
    #[serde(default)]
    pub geo: Vec<GeoEntry>,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Router behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterSection {
    /// Instances offered per call unless overridden on the command line
    #[serde(default = "default_instance_limit")]
    pub instance_limit: usize,
    /// Pick instances in DNS order instead of at random
    #[serde(default)]
    pub stable_select: bool,
}

/// One routing table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableConfig {
    /// Routes by client network
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnets: Vec<SubnetRoute>,
    /// Routes by client location
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<GeoRoute>,
}

impl TableConfig {
    fn to_table(&self) -> StaticRoutingTable {
        StaticRoutingTable::new(self.subnets.clone(), self.routes.clone())
    }

    fn datacenters(&self) -> impl Iterator<Item = &str> {
        self.subnets
            .iter()
            .flat_map(|r| r.datacenters.iter())
            .chain(self.routes.iter().flat_map(|r| r.datacenters.iter()))
            .map(String::as_str)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default values

fn default_instance_limit() -> usize {
    relay_routing::DEFAULT_INSTANCE_LIMIT
}

fn default_hostname() -> String {
    "localhost".to_string()
}

fn default_turn() -> TurnSettings {
    let hostname = default_hostname();
    TurnSettings {
        uri_sets: vec![UriSet {
            urls: vec![
                format!("turn:{hostname}"),
                format!("turn:{hostname}:80?transport=tcp"),
                format!("turns:{hostname}:443?transport=tcp"),
            ],
            weight: 1,
            enrolled: Vec::new(),
        }],
        hostname,
        randomize_rate: 0.0,
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            router: RouterSection::default(),
            turn: default_turn(),
            dns: DnsSnapshot::default(),
            manual: TableConfig::default(),
            performance: TableConfig::default(),
            geo: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RouterSection {
    fn default() -> Self {
        Self {
            instance_limit: default_instance_limit(),
            stable_select: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, contents)?;
        Ok(())
    }

    /// Get default config path
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("relay-routing/config.toml")
    }

    /// Load config from default path, or create default if it doesn't exist
    ///
    /// # Errors
    ///
    /// Returns an error if reading or creating the config fails.
    pub fn load_or_default() -> anyhow::Result<Self> {
        let path = Self::default_path();

        if path.exists() {
            Self::load(&path)
        } else {
            let config = Self::default();
            config.save(&path)?;
            Ok(config)
        }
    }

    /// Instance selection mode
    #[must_use]
    pub fn selection_mode(&self) -> SelectionMode {
        if self.router.stable_select {
            SelectionMode::Stable
        } else {
            SelectionMode::Shuffled
        }
    }

    /// Build a router over the configured tables
    #[must_use]
    pub fn build_router(&self, mode: SelectionMode) -> RelayRouter {
        RelayRouter::new(
            StaticDnsRecords::new(self.dns.clone()),
            StaticTableSource::new(self.performance.to_table()),
            StaticTableSource::new(self.manual.to_table()),
            TurnConfig::new(self.turn.clone()),
            PrefixGeoResolver::new(self.geo.clone()),
            mode,
        )
    }

    /// Datacenters named by a routing table but missing from `dns`
    #[must_use]
    pub fn unresolved_datacenters(&self) -> Vec<String> {
        let mut missing: Vec<String> = self
            .manual
            .datacenters()
            .chain(self.performance.datacenters())
            .filter(|dc| self.dns.get(dc).is_none())
            .map(str::to_string)
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.turn.hostname.trim().is_empty() {
            anyhow::bail!("TURN hostname must not be empty");
        }

        if !(0.0..=1.0).contains(&self.turn.randomize_rate) {
            anyhow::bail!(
                "Randomize rate must be between 0.0 and 1.0, got {}",
                self.turn.randomize_rate
            );
        }

        if !self.turn.uri_sets.iter().any(|set| set.weight > 0) {
            anyhow::bail!("At least one URI set must have a positive weight");
        }

        let valid_schemes = ["turn:", "turns:", "stun:", "stuns:"];
        for url in self.turn.uri_sets.iter().flat_map(|set| set.urls.iter()) {
            if !valid_schemes.iter().any(|scheme| url.starts_with(scheme)) {
                anyhow::bail!(
                    "Invalid relay URL: {}. Must start with one of: {}",
                    url,
                    valid_schemes.join(", ")
                );
            }
        }

        if self.router.instance_limit == 0 {
            anyhow::bail!("Instance limit must be at least 1");
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!(
                "Invalid log level: {}. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            );
        }

        for route in self.manual.routes.iter().chain(self.performance.routes.iter()) {
            if route.continent.trim().is_empty() {
                anyhow::bail!("Routing table entry has an empty continent");
            }
            if route.datacenters.iter().any(|dc| dc.trim().is_empty()) {
                anyhow::bail!(
                    "Routing table entry for {} has an empty datacenter id",
                    route.continent
                );
            }
        }

        Ok(())
    }
}
