//! Fuzz test for instance selection
//!
//! Builds a DNS snapshot and candidate list from arbitrary input and checks
//! that selection never exceeds the limit or panics.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use relay_routing::{DatacenterRecords, DnsSnapshot, InstancePicker, SelectionMode};
use std::net::{Ipv4Addr, Ipv6Addr};

#[derive(Debug, Arbitrary)]
struct Input {
    datacenters: Vec<(u8, Vec<u32>, Vec<u128>)>,
    candidates: Vec<u8>,
    limit: u8,
    prefer_v6: bool,
    stable: bool,
}

fuzz_target!(|input: Input| {
    let snapshot: DnsSnapshot = input
        .datacenters
        .iter()
        .map(|(id, v4, v6)| {
            (
                format!("dc-{id}"),
                DatacenterRecords {
                    ipv4: v4.iter().copied().map(Ipv4Addr::from).collect(),
                    ipv6: v6.iter().copied().map(Ipv6Addr::from).collect(),
                },
            )
        })
        .collect();
    let candidates: Vec<String> = input.candidates.iter().map(|id| format!("dc-{id}")).collect();

    let mode = if input.stable {
        SelectionMode::Stable
    } else {
        SelectionMode::Shuffled
    };
    let limit = usize::from(input.limit);
    let selected = InstancePicker::new(mode).select(&snapshot, &candidates, limit, input.prefer_v6);

    assert!(selected.len() <= limit);
});
