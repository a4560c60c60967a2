//! Router configuration: hostname, per-user URL overrides, randomization and
//! generic relay URLs.

use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Configuration the router reads on every call
pub trait RouterConfig: Send + Sync {
    /// Hostname relay certificates are issued for
    fn hostname(&self) -> String;

    /// URLs pinned to `identity`; empty when the identity has no override
    fn overrides_for(&self, identity: &Uuid) -> Vec<String>;

    /// Whether this call should skip geo routing
    fn randomization_enabled(&self) -> bool;

    /// Hostname-based relay URLs usable by any client
    fn generic_urls(&self) -> Vec<String>;
}

/// A weighted group of relay URLs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UriSet {
    /// Relay URLs, e.g. `turn:turn.example.org`
    pub urls: Vec<String>,
    /// Relative chance of being handed out as the generic set
    #[serde(default = "default_weight")]
    pub weight: u32,
    /// Identities always given exactly this set
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enrolled: Vec<Uuid>,
}

fn default_weight() -> u32 {
    1
}

/// TURN routing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnSettings {
    /// Relay certificate hostname
    pub hostname: String,
    /// Fraction of calls, 0.0 to 1.0, routed to generic URLs without geo lookup
    #[serde(default)]
    pub randomize_rate: f64,
    /// URL groups
    #[serde(default)]
    pub uri_sets: Vec<UriSet>,
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            randomize_rate: 0.0,
            uri_sets: Vec::new(),
        }
    }
}

/// [`RouterConfig`] backed by [`TurnSettings`]
#[derive(Debug, Clone)]
pub struct TurnConfig {
    settings: TurnSettings,
    weights: Option<WeightedIndex<u64>>,
}

impl TurnConfig {
    /// Wrap `settings`
    ///
    /// The randomize rate is clamped to `[0.0, 1.0]`; NaN disables randomization.
    #[must_use]
    pub fn new(mut settings: TurnSettings) -> Self {
        settings.randomize_rate = if settings.randomize_rate.is_nan() {
            0.0
        } else {
            settings.randomize_rate.clamp(0.0, 1.0)
        };
        // summed as u64 so large u32 weights cannot overflow the total
        let weights =
            WeightedIndex::new(settings.uri_sets.iter().map(|s| u64::from(s.weight))).ok();
        Self { settings, weights }
    }

    /// Underlying settings
    #[must_use]
    pub fn settings(&self) -> &TurnSettings {
        &self.settings
    }
}

impl RouterConfig for TurnConfig {
    fn hostname(&self) -> String {
        self.settings.hostname.clone()
    }

    fn overrides_for(&self, identity: &Uuid) -> Vec<String> {
        self.settings
            .uri_sets
            .iter()
            .find(|set| set.enrolled.contains(identity))
            .map(|set| set.urls.clone())
            .unwrap_or_default()
    }

    fn randomization_enabled(&self) -> bool {
        let rate = self.settings.randomize_rate;
        rate > 0.0 && (rate >= 1.0 || rand::thread_rng().gen_bool(rate))
    }

    fn generic_urls(&self) -> Vec<String> {
        // no positive weight means there is nothing to hand out
        let Some(weights) = &self.weights else {
            return Vec::new();
        };
        let index = weights.sample(&mut rand::thread_rng());
        self.settings.uri_sets[index].urls.clone()
    }
}
