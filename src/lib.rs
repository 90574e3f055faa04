pub mod algorithms;
pub mod command;
pub mod config;
pub mod control_server;
pub mod error;
pub mod network;
pub mod protocol;

use std::sync::Arc;
use tokio::sync::RwLock;

pub use error::{NetworkError, Result};
pub use network::Topology;

/// Stable router identifier, independent of the router's position.
pub type RouterId = uuid::Uuid;

/// Topology shared between the prompt and control server connections.
///
/// Mutations hold the write lock for the whole mutate-and-recompute step;
/// simulations only need the read lock.
pub type SharedTopology = Arc<RwLock<Topology>>;

pub fn share(topology: Topology) -> SharedTopology {
    Arc::new(RwLock::new(topology))
}
