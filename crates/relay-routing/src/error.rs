//! Error types for relay routing.

use crate::geo::GeoError;
use crate::table::TableError;
use thiserror::Error;

/// Errors produced while computing relay routes.
///
/// Only [`RoutingError::InvalidArgument`] is ever returned from
/// [`RelayRouter::route`](crate::RelayRouter::route); every other variant is
/// absorbed at the routing boundary and replaced by the generic fallback.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Caller passed an argument that violates the routing contract
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Geo resolution of the client address failed
    #[error("Geo lookup failed: {0}")]
    Geo(#[from] GeoError),

    /// A routing table could not answer
    #[error("Routing table lookup failed: {0}")]
    Table(#[from] TableError),
}

impl RoutingError {
    /// Whether this error is absorbed by the routing boundary
    #[must_use]
    pub fn is_absorbed(&self) -> bool {
        !matches!(self, Self::InvalidArgument(_))
    }
}

/// Result alias for routing operations
pub type Result<T> = std::result::Result<T, RoutingError>;
