//! IP network prefixes used by the in-memory geo resolver and routing tables.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use thiserror::Error;

/// Prefix parse errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PrefixParseError {
    /// Address portion did not parse
    #[error("invalid address in prefix '{0}'")]
    InvalidAddress(String),

    /// Prefix length missing, non-numeric, or too long for the family
    #[error("invalid prefix length in '{0}'")]
    InvalidLength(String),
}

/// An IPv4 or IPv6 network in CIDR notation
///
/// A bare address parses as a host prefix (`/32` or `/128`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IpPrefix {
    network: IpAddr,
    len: u8,
}

impl IpPrefix {
    /// Create a prefix, masking off host bits
    ///
    /// # Errors
    ///
    /// Returns [`PrefixParseError::InvalidLength`] if `len` exceeds the
    /// address family width.
    pub fn new(addr: IpAddr, len: u8) -> Result<Self, PrefixParseError> {
        if len > max_len(&addr) {
            return Err(PrefixParseError::InvalidLength(format!("{addr}/{len}")));
        }
        Ok(Self {
            network: mask(addr, len),
            len,
        })
    }

    /// Network address with host bits cleared
    #[must_use]
    pub fn network(&self) -> IpAddr {
        self.network
    }

    /// Prefix length in bits
    #[must_use]
    pub fn len(&self) -> u8 {
        self.len
    }

    /// Whether this prefix matches every address of its family
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check whether `addr` falls inside this network
    ///
    /// Addresses of the other family never match.
    #[must_use]
    pub fn contains(&self, addr: &IpAddr) -> bool {
        match (self.network, addr) {
            (IpAddr::V4(_), IpAddr::V4(_)) | (IpAddr::V6(_), IpAddr::V6(_)) => {
                mask(*addr, self.len) == self.network
            }
            _ => false,
        }
    }
}

fn max_len(addr: &IpAddr) -> u8 {
    match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

fn mask(addr: IpAddr, len: u8) -> IpAddr {
    match addr {
        IpAddr::V4(v4) => {
            let bits = u32::from(v4);
            let mask = u32::MAX.checked_shl(32 - u32::from(len)).unwrap_or(0);
            IpAddr::V4((bits & mask).into())
        }
        IpAddr::V6(v6) => {
            let bits = u128::from(v6);
            let mask = u128::MAX.checked_shl(128 - u32::from(len)).unwrap_or(0);
            IpAddr::V6((bits & mask).into())
        }
    }
}

impl FromStr for IpPrefix {
    type Err = PrefixParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, len) = match s.split_once('/') {
            Some((addr, len)) => (addr, Some(len)),
            None => (s, None),
        };

        let addr: IpAddr = addr
            .trim()
            .parse()
            .map_err(|_| PrefixParseError::InvalidAddress(s.to_string()))?;

        let len = match len {
            Some(len) => len
                .trim()
                .parse::<u8>()
                .map_err(|_| PrefixParseError::InvalidLength(s.to_string()))?,
            None => max_len(&addr),
        };

        Self::new(addr, len).map_err(|_| PrefixParseError::InvalidLength(s.to_string()))
    }
}

impl TryFrom<String> for IpPrefix {
    type Error = PrefixParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<IpPrefix> for String {
    fn from(prefix: IpPrefix) -> Self {
        prefix.to_string()
    }
}

impl fmt::Display for IpPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.len)
    }
}
