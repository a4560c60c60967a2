//! TURN URL assembly.

/// Plain TURN scheme
pub const TURN_SCHEME: &str = "turn";

/// TURN over TLS scheme
pub const TURNS_SCHEME: &str = "turns";

/// Port for TURN over TCP
pub const TCP_PORT: u16 = 80;

/// Port for TURN over TLS
pub const TLS_PORT: u16 = 443;

/// Query suffix selecting TCP transport
pub const TCP_TRANSPORT: &str = "transport=tcp";

/// Expand each instance address into its UDP, TCP and TLS relay URLs
///
/// IPv6 addresses must already be bracketed.
#[must_use]
pub fn instance_urls(instances: &[String]) -> Vec<String> {
    instances
        .iter()
        .flat_map(|ip| {
            [
                format!("{TURN_SCHEME}:{ip}"),
                format!("{TURN_SCHEME}:{ip}:{TCP_PORT}?{TCP_TRANSPORT}"),
                format!("{TURNS_SCHEME}:{ip}:{TLS_PORT}?{TCP_TRANSPORT}"),
            ]
        })
        .collect()
}

/// Keep only generic URLs a client can reach over UDP
///
/// Once instance URLs are present they already cover the TCP and TLS
/// transports, so only plain `turn:` URLs without a TCP transport survive.
#[must_use]
pub fn minimal_fallback_urls(generic: Vec<String>) -> Vec<String> {
    let prefix = format!("{TURN_SCHEME}:");
    generic
        .into_iter()
        .filter(|url| url.starts_with(&prefix) && !url.ends_with(TCP_TRANSPORT))
        .collect()
}
