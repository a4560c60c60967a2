//! Property-based tests for relay routing
//!
//! Uses proptest to check the selection laws across many supply and limit
//! combinations.

use proptest::prelude::*;
use relay_routing::{DatacenterRecords, DnsSnapshot, InstancePicker, Quota, SelectionMode};
use std::net::{Ipv4Addr, Ipv6Addr};

fn supply(datacenters: usize, ipv4: usize, ipv6: usize) -> (DnsSnapshot, Vec<String>) {
    let names: Vec<String> = (0..datacenters).map(|i| format!("dc-{i}")).collect();
    let snapshot = names
        .iter()
        .enumerate()
        .map(|(dc, name)| {
            let dc = dc as u8;
            (
                name.clone(),
                DatacenterRecords {
                    ipv4: (0..ipv4 as u8).map(|i| Ipv4Addr::new(10, dc, 0, i)).collect(),
                    ipv6: (0..ipv6 as u16)
                        .map(|i| Ipv6Addr::new(0x2001, 0xdb8, u16::from(dc), 0, 0, 0, 0, i))
                        .collect(),
                },
            )
        })
        .collect();
    (snapshot, names)
}

fn split(selected: &[String]) -> (usize, usize) {
    let v6 = selected.iter().filter(|s| s.starts_with('[')).count();
    (selected.len() - v6, v6)
}

fn mode() -> impl Strategy<Value = SelectionMode> {
    prop_oneof![Just(SelectionMode::Stable), Just(SelectionMode::Shuffled)]
}

// ============================================================================
// Quota Properties
// ============================================================================

mod quota_properties {
    use super::*;

    proptest! {
        /// Quotas always add up to the limit, with floor(limit / 3) for the
        /// non-preferred family
        #[test]
        fn quota_partitions_limit(limit in 0usize..1000, prefer_v6 in any::<bool>()) {
            let quota = Quota::new(limit, prefer_v6);
            prop_assert_eq!(quota.ipv4 + quota.ipv6, limit);

            let (preferred, other) = if prefer_v6 {
                (quota.ipv6, quota.ipv4)
            } else {
                (quota.ipv4, quota.ipv6)
            };
            prop_assert_eq!(other, limit / 3);
            prop_assert_eq!(preferred, limit - limit / 3);
        }

        /// With enough supply in both families the split matches the quota exactly
        #[test]
        fn sufficient_supply_meets_quota(
            limit in 1usize..30,
            prefer_v6 in any::<bool>(),
            datacenters in 1usize..4,
            mode in mode(),
        ) {
            let (snapshot, names) = supply(datacenters, limit, limit);
            let selected = InstancePicker::new(mode).select(&snapshot, &names, limit, prefer_v6);

            let quota = Quota::new(limit, prefer_v6);
            prop_assert_eq!(split(&selected), (quota.ipv4, quota.ipv6));
        }
    }
}

// ============================================================================
// Redistribution Properties
// ============================================================================

mod redistribution_properties {
    use super::*;

    proptest! {
        /// Counts follow the redistribution rule and never exceed the limit
        #[test]
        fn redistribution_rule(
            limit in 1usize..20,
            prefer_v6 in any::<bool>(),
            datacenters in 1usize..4,
            ipv4 in 0usize..12,
            ipv6 in 0usize..12,
            mode in mode(),
        ) {
            let (snapshot, names) = supply(datacenters, ipv4, ipv6);
            let selected = InstancePicker::new(mode).select(&snapshot, &names, limit, prefer_v6);
            let (got_v4, got_v6) = split(&selected);

            let avail_v4 = datacenters * ipv4.min(limit);
            let avail_v6 = datacenters * ipv6.min(limit);
            let quota = Quota::new(limit, prefer_v6);

            let want_v4 = avail_v4.min(quota.ipv4.max(limit.saturating_sub(avail_v6)));
            let want_v6 = avail_v6.min(limit - want_v4);

            prop_assert_eq!(got_v4, want_v4);
            prop_assert_eq!(got_v6, want_v6);
            prop_assert_eq!(got_v4 + got_v6, limit.min(avail_v4 + avail_v6));
        }

        /// IPv4 entries always come before bracketed IPv6 entries
        #[test]
        fn ipv4_before_ipv6(
            limit in 1usize..20,
            prefer_v6 in any::<bool>(),
            ipv4 in 0usize..8,
            ipv6 in 0usize..8,
        ) {
            let (snapshot, names) = supply(2, ipv4, ipv6);
            let selected = InstancePicker::new(SelectionMode::Shuffled)
                .select(&snapshot, &names, limit, prefer_v6);

            let first_v6 = selected
                .iter()
                .position(|s| s.starts_with('['))
                .unwrap_or(selected.len());
            prop_assert!(
                selected[first_v6..]
                    .iter()
                    .all(|s| s.starts_with('[') && s.ends_with(']'))
            );
        }
    }
}

// ============================================================================
// Stability Properties
// ============================================================================

mod stability_properties {
    use super::*;

    proptest! {
        /// Stable mode returns the same selection for the same input
        #[test]
        fn stable_selection_idempotent(
            limit in 1usize..20,
            prefer_v6 in any::<bool>(),
            datacenters in 1usize..4,
            ipv4 in 0usize..12,
            ipv6 in 0usize..12,
        ) {
            let (snapshot, names) = supply(datacenters, ipv4, ipv6);
            let picker = InstancePicker::new(SelectionMode::Stable);

            let first = picker.select(&snapshot, &names, limit, prefer_v6);
            let second = picker.select(&snapshot, &names, limit, prefer_v6);
            prop_assert_eq!(first, second);
        }
    }
}

// ============================================================================
// URL Expansion Properties
// ============================================================================

mod url_properties {
    use super::*;
    use relay_routing::urls::instance_urls;

    proptest! {
        /// N instances expand to exactly 3N URLs in udp, tcp, tls order
        #[test]
        fn three_urls_per_instance(
            limit in 1usize..20,
            ipv4 in 0usize..8,
            ipv6 in 0usize..8,
        ) {
            let (snapshot, names) = supply(1, ipv4, ipv6);
            let selected = InstancePicker::new(SelectionMode::Stable)
                .select(&snapshot, &names, limit, false);
            let urls = instance_urls(&selected);

            prop_assert_eq!(urls.len(), 3 * selected.len());
            for (ip, chunk) in selected.iter().zip(urls.chunks(3)) {
                prop_assert_eq!(&chunk[0], &format!("turn:{ip}"));
                prop_assert_eq!(&chunk[1], &format!("turn:{ip}:80?transport=tcp"));
                prop_assert_eq!(&chunk[2], &format!("turns:{ip}:443?transport=tcp"));
            }
        }
    }
}
