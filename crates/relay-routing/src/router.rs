//! Relay router: turns a call request into relay URLs.

use crate::config::RouterConfig;
use crate::dns::DnsRecordsSource;
use crate::error::{Result, RoutingError};
use crate::geo::{GeoResolver, Location};
use crate::options::RelayOptions;
use crate::select::{InstancePicker, SelectionMode};
use crate::table::{RoutingTableKind, RoutingTableSource};
use crate::urls::{instance_urls, minimal_fallback_urls};
use std::net::IpAddr;
use std::sync::Arc;
use uuid::Uuid;

/// Routes calling clients to relay instances
///
/// Decision order, first match wins:
/// 1. URLs pinned to the caller's identity
/// 2. Generic URLs when there is no client address or randomization is on
/// 3. Datacenters from the manual table, else the performance table, for the
///    client's geo location, expanded into instance URLs
///
/// Failures in step 3 never reach the caller; they degrade to the generic URLs.
/// The router keeps no per-call state and can be shared across threads.
pub struct RelayRouter {
    dns: Arc<dyn DnsRecordsSource>,
    performance: Arc<dyn RoutingTableSource>,
    manual: Arc<dyn RoutingTableSource>,
    config: Arc<dyn RouterConfig>,
    geo: Arc<dyn GeoResolver>,
    picker: InstancePicker,
}

impl RelayRouter {
    /// Create a router over its collaborators
    ///
    /// `mode` decides once, for the router's lifetime, whether instances are
    /// picked in snapshot order or sampled at random.
    #[must_use]
    pub fn new(
        dns: impl DnsRecordsSource + 'static,
        performance: impl RoutingTableSource + 'static,
        manual: impl RoutingTableSource + 'static,
        config: impl RouterConfig + 'static,
        geo: impl GeoResolver + 'static,
        mode: SelectionMode,
    ) -> Self {
        Self {
            dns: Arc::new(dns),
            performance: Arc::new(performance),
            manual: Arc::new(manual),
            config: Arc::new(config),
            geo: Arc::new(geo),
            picker: InstancePicker::new(mode),
        }
    }

    /// Instance selection mode
    #[must_use]
    pub fn selection_mode(&self) -> SelectionMode {
        self.picker.mode()
    }

    /// Relay options for a call
    ///
    /// Returns both IPv4 and IPv6 instance URLs, two instances of the client's
    /// own address family for every one of the other.
    ///
    /// * `identity` - account placing the call
    /// * `client` - address routing is based on, if known
    /// * `instance_limit` - maximum number of instances to offer
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::InvalidArgument`] if `instance_limit` is zero.
    /// Every other failure is logged and answered with the generic URLs.
    ///
    /// # Panics
    ///
    /// Panics raised by a collaborator are not absorbed and propagate to the
    /// caller.
    pub fn route(
        &self,
        identity: &Uuid,
        client: Option<IpAddr>,
        instance_limit: usize,
    ) -> Result<RelayOptions> {
        if instance_limit == 0 {
            return Err(RoutingError::InvalidArgument(
                "instance limit cannot be less than one",
            ));
        }

        match self.route_inner(identity, client, instance_limit) {
            Ok(options) => Ok(options),
            Err(e) if !e.is_absorbed() => Err(e),
            Err(e) => {
                tracing::error!("Failed to perform routing for {:?}: {}", client, e);
                Ok(RelayOptions::unrouted(
                    self.config.hostname(),
                    self.config.generic_urls(),
                ))
            }
        }
    }

    fn route_inner(
        &self,
        identity: &Uuid,
        client: Option<IpAddr>,
        instance_limit: usize,
    ) -> Result<RelayOptions> {
        let hostname = self.config.hostname();

        let targeted = self.config.overrides_for(identity);
        if !targeted.is_empty() {
            tracing::debug!(
                "Using {} targeted relay URLs for {}",
                targeted.len(),
                identity
            );
            return Ok(RelayOptions::unrouted(hostname, targeted));
        }

        // IPv4-mapped IPv6 clients route as the IPv4 address they carry
        let client = match client {
            Some(addr) if !self.config.randomization_enabled() => addr.to_canonical(),
            _ => {
                tracing::debug!("Skipping geo routing (client address: {:?})", client);
                return Ok(RelayOptions::unrouted(hostname, self.config.generic_urls()));
            }
        };

        let location = Location::from_record(self.geo.resolve(client)?);
        let datacenters = self.datacenters_for(client, &location)?;

        let instances = self.picker.select(
            &self.dns.snapshot(),
            &datacenters,
            instance_limit,
            client.is_ipv6(),
        );

        Ok(RelayOptions::routed(
            hostname,
            instance_urls(&instances),
            minimal_fallback_urls(self.config.generic_urls()),
        ))
    }

    /// Manual routes take priority; performance routes fill in when the manual
    /// table has nothing for this client.
    fn datacenters_for(&self, client: IpAddr, location: &Location) -> Result<Vec<String>> {
        for (kind, source) in [
            (RoutingTableKind::Manual, &self.manual),
            (RoutingTableKind::Performance, &self.performance),
        ] {
            let datacenters = source.table().lookup(
                client,
                &location.continent,
                &location.country,
                location.subdivision.as_deref(),
            )?;

            if !datacenters.is_empty() {
                tracing::debug!(
                    "Routing {} ({}/{}/{:?}) via {} table: {:?}",
                    client,
                    location.continent,
                    location.country,
                    location.subdivision,
                    kind,
                    datacenters
                );
                return Ok(datacenters);
            }
        }

        tracing::debug!("No routing table entry for {}", client);
        Ok(Vec::new())
    }
}

impl std::fmt::Debug for RelayRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayRouter")
            .field("mode", &self.picker.mode())
            .finish_non_exhaustive()
    }
}
