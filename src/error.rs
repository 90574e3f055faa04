//! Error types for the SDN controller core.

use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, NetworkError>;

/// Errors raised by topology mutations, lookups and packet simulation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkError {
    /// No router with this name exists
    #[error("router not found: {0}")]
    RouterNotFound(String),

    /// The two routers are not linked
    #[error("no link between {0} and {1}")]
    LinkNotFound(String, String),

    /// A router with this name already exists
    #[error("router name already in use: {0}")]
    DuplicateName(String),

    /// The forwarding table at `from` has no entry for `to`
    #[error("no route from {from} to {to}")]
    NoRoute { from: String, to: String },

    /// The packet exceeded the hop ceiling without reaching its destination
    #[error("routing loop: packet still in flight after {hops} hops")]
    RoutingLoop { hops: usize },
}

impl NetworkError {
    /// Whether the error came from a failed lookup rather than a routing decision.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RouterNotFound(_) | Self::LinkNotFound(..))
    }
}
