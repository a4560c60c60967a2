//! Relay instance selection.
//!
//! Picks instance addresses from the candidate datacenters, giving the
//! client's own address family two thirds of the slots. When one family runs
//! short the other family takes over its unused slots.

use crate::dns::DnsSnapshot;
use rand::seq::SliceRandom;
use std::net::{Ipv4Addr, Ipv6Addr};

/// How instances are picked within a datacenter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// First N addresses in snapshot order; repeatable
    Stable,
    /// Uniform random sample without replacement
    #[default]
    Shuffled,
}

/// Picks up to `n` values from a list
pub type PickFn<T> = fn(&[T], usize) -> Vec<T>;

/// First `n` values, in order
#[must_use]
pub fn pick_stable<T: Clone>(values: &[T], n: usize) -> Vec<T> {
    values.iter().take(n).cloned().collect()
}

/// `n` values sampled without replacement; the whole list, shuffled, if `n`
/// covers it
#[must_use]
pub fn pick_shuffled<T: Clone>(values: &[T], n: usize) -> Vec<T> {
    values
        .choose_multiple(&mut rand::thread_rng(), n)
        .cloned()
        .collect()
}

/// Per-family pickers, fixed when the router is built
#[derive(Debug, Clone, Copy)]
pub struct InstancePicker {
    mode: SelectionMode,
    pick_v4: PickFn<Ipv4Addr>,
    pick_v6: PickFn<Ipv6Addr>,
}

impl InstancePicker {
    /// Picker for `mode`
    #[must_use]
    pub fn new(mode: SelectionMode) -> Self {
        match mode {
            SelectionMode::Stable => Self {
                mode,
                pick_v4: pick_stable,
                pick_v6: pick_stable,
            },
            SelectionMode::Shuffled => Self {
                mode,
                pick_v4: pick_shuffled,
                pick_v6: pick_shuffled,
            },
        }
    }

    /// Mode this picker was built for
    #[must_use]
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Select instance addresses for `datacenters`
    ///
    /// Returns at most `limit` entries: IPv4 addresses first, then IPv6
    /// addresses wrapped in brackets for use in a URL authority. Datacenter
    /// order is kept; addresses are not deduplicated across datacenters.
    #[must_use]
    pub fn select(
        &self,
        snapshot: &DnsSnapshot,
        datacenters: &[String],
        limit: usize,
        prefer_v6: bool,
    ) -> Vec<String> {
        if datacenters.is_empty() || limit == 0 {
            return Vec::new();
        }

        let quota = Quota::new(limit, prefer_v6);

        let mut ipv4: Vec<Ipv4Addr> = datacenters
            .iter()
            .flat_map(|dc| (self.pick_v4)(snapshot.ipv4(dc), limit))
            .collect();
        let mut ipv6: Vec<Ipv6Addr> = datacenters
            .iter()
            .flat_map(|dc| (self.pick_v6)(snapshot.ipv6(dc), limit))
            .collect();

        let ipv4_count = quota.ipv4.max(limit.saturating_sub(ipv6.len()));
        ipv4.truncate(ipv4_count);
        ipv6.truncate(limit - ipv4.len());

        tracing::trace!(
            "Selected {} IPv4 and {} IPv6 instances (quota {}/{})",
            ipv4.len(),
            ipv6.len(),
            quota.ipv4,
            quota.ipv6
        );

        ipv4.iter()
            .map(Ipv4Addr::to_string)
            .chain(ipv6.iter().map(|addr| format!("[{addr}]")))
            .collect()
    }
}

impl Default for InstancePicker {
    fn default() -> Self {
        Self::new(SelectionMode::default())
    }
}

/// Target instance counts per address family before redistribution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    /// IPv4 slots
    pub ipv4: usize,
    /// IPv6 slots
    pub ipv6: usize,
}

impl Quota {
    /// Split `limit` 2:1 in favor of the preferred family
    ///
    /// The non-preferred family gets `limit / 3` (rounded down), so the
    /// preferred family keeps the remainder.
    #[must_use]
    pub fn new(limit: usize, prefer_v6: bool) -> Self {
        let other = limit / 3;
        let preferred = limit - other;
        if prefer_v6 {
            Self {
                ipv4: other,
                ipv6: preferred,
            }
        } else {
            Self {
                ipv4: preferred,
                ipv6: other,
            }
        }
    }
}
