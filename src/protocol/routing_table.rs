use serde::Serialize;
use std::collections::HashMap;
use crate::RouterId;

/// Distance recorded for routers that cannot be reached.
pub const UNREACHABLE: u32 = u32::MAX;

/// Destination → exit interface mapping of a single router, with the hop
/// count to every router in the topology.
///
/// Interface indices refer to positions in the owning router's `links` and
/// are only meaningful until the next link mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardingTable {
    next_hops: HashMap<RouterId, Option<usize>>,
    distances: HashMap<RouterId, u32>,
}

impl ForwardingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_route(&mut self, destination: RouterId, interface: Option<usize>) {
        self.next_hops.insert(destination, interface);
    }

    pub fn set_distance(&mut self, destination: RouterId, distance: u32) {
        self.distances.insert(destination, distance);
    }

    /// Exit interface towards `destination`, `None` if there is no route.
    pub fn interface_for(&self, destination: &RouterId) -> Option<usize> {
        self.next_hops.get(destination).copied().flatten()
    }

    pub fn has_entry(&self, destination: &RouterId) -> bool {
        self.next_hops.contains_key(destination)
    }

    pub fn distance_to(&self, destination: &RouterId) -> u32 {
        self.distances.get(destination).copied().unwrap_or(UNREACHABLE)
    }

    pub fn is_reachable(&self, destination: &RouterId) -> bool {
        self.distance_to(destination) < UNREACHABLE
    }

    pub fn clear(&mut self) {
        self.next_hops.clear();
        self.distances.clear();
    }

    pub fn len(&self) -> usize {
        self.next_hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.next_hops.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RouterId, &Option<usize>)> {
        self.next_hops.iter()
    }
}

/// A forwarding table row resolved to router names, for printing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForwardingEntry {
    pub destination: String,
    pub interface: Option<usize>,
    pub neighbor: Option<String>,
    pub distance: Option<u32>,
}
