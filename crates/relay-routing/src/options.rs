//! Routing result handed back to callers.

use serde::{Deserialize, Serialize};

/// Relay endpoints offered to a calling client
///
/// `resolved_urls` is `None` when no geo-targeted routing happened (override,
/// randomization, missing address or an absorbed failure). It is `Some` with a
/// possibly empty list when routing ran against the tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayOptions {
    /// TLS hostname clients should verify relay certificates against
    pub hostname: String,
    /// Instance URLs built from concrete IP addresses
    #[serde(rename = "urlsWithIps", skip_serializing_if = "Option::is_none", default)]
    pub resolved_urls: Option<Vec<String>>,
    /// Hostname-based URLs, always present
    #[serde(rename = "urls")]
    pub fallback_urls: Vec<String>,
}

impl RelayOptions {
    /// Options carrying only hostname-based URLs
    #[must_use]
    pub fn unrouted(hostname: impl Into<String>, fallback_urls: Vec<String>) -> Self {
        Self {
            hostname: hostname.into(),
            resolved_urls: None,
            fallback_urls,
        }
    }

    /// Options produced by geo-targeted routing
    #[must_use]
    pub fn routed(
        hostname: impl Into<String>,
        resolved_urls: Vec<String>,
        fallback_urls: Vec<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            resolved_urls: Some(resolved_urls),
            fallback_urls,
        }
    }

    /// Whether geo-targeted routing produced this result
    #[must_use]
    pub fn is_routed(&self) -> bool {
        self.resolved_urls.is_some()
    }
}
