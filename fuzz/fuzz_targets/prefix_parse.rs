//! Fuzz test for IP prefix parsing
//!
//! Tests that arbitrary input doesn't cause panics when parsed as a CIDR
//! prefix, and that parsed prefixes contain their own network address.

#![no_main]

use libfuzzer_sys::fuzz_target;
use relay_routing::IpPrefix;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(prefix) = s.parse::<IpPrefix>() {
            assert!(prefix.contains(&prefix.network()));

            let reparsed: IpPrefix = prefix.to_string().parse().unwrap();
            assert_eq!(reparsed, prefix);
        }
    }
});
