use uuid::Uuid;

use crate::RouterId;
use crate::protocol::ForwardingTable;

/// A router in the simulated network.
///
/// `links[i]` is the neighbour reached through local interface `i`.
#[derive(Debug, Clone)]
pub struct Router {
    pub id: RouterId,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub links: Vec<RouterId>,
    pub forwarding: ForwardingTable,
}

impl Router {
    pub fn new(name: String, x: f64, y: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            x,
            y,
            links: Vec::new(),
            forwarding: ForwardingTable::new(),
        }
    }

    pub fn is_linked_to(&self, other: &RouterId) -> bool {
        self.links.contains(other)
    }

    /// Interface index of the link to `neighbor`.
    pub fn interface_to(&self, neighbor: &RouterId) -> Option<usize> {
        self.links.iter().position(|id| id == neighbor)
    }

    /// Neighbour behind interface `interface`.
    pub fn neighbor_at(&self, interface: usize) -> Option<RouterId> {
        self.links.get(interface).copied()
    }

    /// The neighbour the forwarding table sends `destination` traffic to.
    pub fn ideal_neighbor(&self, destination: &RouterId) -> Option<RouterId> {
        self.forwarding
            .interface_for(destination)
            .and_then(|interface| self.neighbor_at(interface))
    }

    pub(crate) fn detach(&mut self, neighbor: &RouterId) -> bool {
        let before = self.links.len();
        self.links.retain(|id| id != neighbor);
        before != self.links.len()
    }
}
