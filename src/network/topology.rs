use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::Serialize;

use crate::RouterId;
use crate::algorithms::dijkstra::compute_forwarding_table;
use crate::error::{NetworkError, Result};
use crate::network::link::LinkUsage;
use crate::network::router::Router;
use crate::protocol::ForwardingEntry;

/// Traffic carried by one link, resolved to router names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    pub a: String,
    pub b: String,
    pub times_used: u64,
}

/// The set of routers and links making up the simulated network.
///
/// Every successful mutation recomputes the forwarding table of every router
/// before returning, so tables always reflect a consistent snapshot.
#[derive(Debug)]
pub struct Topology {
    order: Vec<RouterId>,
    routers: HashMap<RouterId, Router>,
    names: HashMap<String, RouterId>,
    usage: LinkUsage,
    recomputed_at: DateTime<Utc>,
    hop_limit: Option<usize>,
}

impl Default for Topology {
    fn default() -> Self {
        Self::new()
    }
}

impl Topology {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            routers: HashMap::new(),
            names: HashMap::new(),
            usage: LinkUsage::new(),
            recomputed_at: Utc::now(),
            hop_limit: None,
        }
    }

    pub fn add_router(&mut self, name: &str, x: f64, y: f64) -> Result<RouterId> {
        let id = self.insert_router(name, x, y)?;
        info!("Added router {} at ({}, {})", name, x, y);
        self.recompute();
        Ok(id)
    }

    pub fn remove_router(&mut self, name: &str) -> Result<()> {
        let id = self.id_of(name)?;

        let Some(router) = self.routers.remove(&id) else {
            return Err(NetworkError::RouterNotFound(name.to_string()));
        };
        self.names.remove(&router.name);
        self.order.retain(|other| *other != id);

        for neighbor in &router.links {
            if let Some(neighbor) = self.routers.get_mut(neighbor) {
                neighbor.detach(&id);
            }
        }
        let dropped = self.usage.remove_router(id);

        info!("Removed router {} and {} link(s)", name, dropped);
        self.recompute();
        Ok(())
    }

    /// Links two routers. Returns false when nothing changed, either because
    /// the routers are already linked or because `a` and `b` are the same.
    pub fn link_routers(&mut self, a: &str, b: &str) -> Result<bool> {
        let created = self.insert_link(a, b)?;
        if created {
            info!("Linked {} <-> {}", a, b);
        } else {
            debug!("Link {} <-> {} not created (existing or self link)", a, b);
        }
        self.recompute();
        Ok(created)
    }

    pub fn unlink_routers(&mut self, a: &str, b: &str) -> Result<()> {
        let id_a = self.id_of(a)?;
        let id_b = self.id_of(b)?;

        let linked = self.usage.contains(id_a, id_b)
            && self.routers.get(&id_a).is_some_and(|r| r.is_linked_to(&id_b))
            && self.routers.get(&id_b).is_some_and(|r| r.is_linked_to(&id_a));
        if !linked {
            return Err(NetworkError::LinkNotFound(a.to_string(), b.to_string()));
        }

        for (from, to) in [(id_a, id_b), (id_b, id_a)] {
            if let Some(router) = self.routers.get_mut(&from) {
                router.detach(&to);
            }
        }
        self.usage.remove(id_a, id_b);

        info!("Unlinked {} <-> {}", a, b);
        self.recompute();
        Ok(())
    }

    /// Rebuilds the forwarding table of every router from the current topology.
    pub fn recompute(&mut self) {
        let tables: Vec<_> = self
            .order
            .iter()
            .map(|id| (*id, compute_forwarding_table(self, *id)))
            .collect();

        for (id, table) in tables {
            if let Some(router) = self.routers.get_mut(&id) {
                router.forwarding = table;
            }
        }

        self.recomputed_at = Utc::now();
        debug!(
            "Recomputed forwarding tables for {} routers, {} links",
            self.order.len(),
            self.usage.len()
        );
    }

    pub(crate) fn insert_router(&mut self, name: &str, x: f64, y: f64) -> Result<RouterId> {
        if self.names.contains_key(name) {
            return Err(NetworkError::DuplicateName(name.to_string()));
        }

        let router = Router::new(name.to_string(), x, y);
        let id = router.id;
        self.names.insert(router.name.clone(), id);
        self.order.push(id);
        self.routers.insert(id, router);
        Ok(id)
    }

    pub(crate) fn insert_link(&mut self, a: &str, b: &str) -> Result<bool> {
        let id_a = self.id_of(a)?;
        let id_b = self.id_of(b)?;
        if id_a == id_b {
            return Ok(false);
        }

        let already_linked = self.routers.get(&id_a).is_some_and(|r| r.is_linked_to(&id_b))
            || self.routers.get(&id_b).is_some_and(|r| r.is_linked_to(&id_a));
        if already_linked {
            return Ok(false);
        }

        for (from, to) in [(id_a, id_b), (id_b, id_a)] {
            if let Some(router) = self.routers.get_mut(&from) {
                router.links.push(to);
            }
        }
        self.usage.insert(id_a, id_b);
        Ok(true)
    }

    pub fn set_hop_limit(&mut self, hop_limit: Option<usize>) {
        self.hop_limit = hop_limit;
    }

    /// Maximum hops a simulated packet may take: the configured limit, or
    /// the number of routers.
    pub fn hop_limit(&self) -> usize {
        self.hop_limit.unwrap_or(self.order.len())
    }

    pub fn id_of(&self, name: &str) -> Result<RouterId> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| NetworkError::RouterNotFound(name.to_string()))
    }

    pub fn get(&self, id: &RouterId) -> Option<&Router> {
        self.routers.get(id)
    }

    pub fn router(&self, name: &str) -> Option<&Router> {
        self.names.get(name).and_then(|id| self.routers.get(id))
    }

    pub fn name_of(&self, id: &RouterId) -> Option<&str> {
        self.routers.get(id).map(|router| router.name.as_str())
    }

    /// Router ids in position order.
    pub fn order(&self) -> &[RouterId] {
        &self.order
    }

    /// Routers in position order.
    pub fn routers(&self) -> impl Iterator<Item = &Router> {
        self.order.iter().filter_map(|id| self.routers.get(id))
    }

    pub fn router_names(&self) -> Vec<String> {
        self.routers().map(|router| router.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn link_count(&self) -> usize {
        self.usage.len()
    }

    pub fn usage(&self) -> &LinkUsage {
        &self.usage
    }

    pub fn recomputed_at(&self) -> DateTime<Utc> {
        self.recomputed_at
    }

    /// Interfaces of `name` as (index, neighbour name) pairs.
    pub fn interfaces(&self, name: &str) -> Result<Vec<(usize, String)>> {
        let router = self.lookup(name)?;
        Ok(router
            .links
            .iter()
            .enumerate()
            .filter_map(|(i, id)| self.name_of(id).map(|n| (i, n.to_string())))
            .collect())
    }

    /// The forwarding table of `name` resolved to names, one row per other
    /// router in position order.
    pub fn forwarding_table(&self, name: &str) -> Result<Vec<ForwardingEntry>> {
        let router = self.lookup(name)?;
        Ok(self
            .routers()
            .filter(|destination| destination.id != router.id)
            .map(|destination| {
                let interface = router.forwarding.interface_for(&destination.id);
                let neighbor = interface
                    .and_then(|i| router.neighbor_at(i))
                    .and_then(|id| self.name_of(&id))
                    .map(str::to_string);
                let distance = router
                    .forwarding
                    .is_reachable(&destination.id)
                    .then(|| router.forwarding.distance_to(&destination.id));
                ForwardingEntry {
                    destination: destination.name.clone(),
                    interface,
                    neighbor,
                    distance,
                }
            })
            .collect())
    }

    /// Hop count from `src` to `dst`, `None` when unreachable.
    pub fn distance(&self, src: &str, dst: &str) -> Result<Option<u32>> {
        let router = self.lookup(src)?;
        let destination = self.id_of(dst)?;
        Ok(router
            .forwarding
            .is_reachable(&destination)
            .then(|| router.forwarding.distance_to(&destination)))
    }

    /// Usage counter of the a-b link, `None` when they are not linked.
    pub fn link_usage(&self, a: &str, b: &str) -> Result<Option<u64>> {
        let id_a = self.id_of(a)?;
        let id_b = self.id_of(b)?;
        Ok(self.usage.lookup(id_a, id_b))
    }

    /// All links with their counters, ordered by the position of their endpoints.
    pub fn link_stats(&self) -> Vec<LinkStats> {
        let positions: HashMap<RouterId, usize> = self
            .order
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, i))
            .collect();

        let mut links: Vec<_> = self
            .usage
            .iter()
            .filter_map(|(key, times_used)| {
                let (a, b) = key.endpoints();
                let (pa, pb) = (*positions.get(&a)?, *positions.get(&b)?);
                Some(if pa <= pb { (pa, pb, times_used) } else { (pb, pa, times_used) })
            })
            .collect();
        links.sort_unstable();

        links
            .into_iter()
            .map(|(pa, pb, times_used)| LinkStats {
                a: self.routers[&self.order[pa]].name.clone(),
                b: self.routers[&self.order[pb]].name.clone(),
                times_used,
            })
            .collect()
    }

    fn lookup(&self, name: &str) -> Result<&Router> {
        self.router(name)
            .ok_or_else(|| NetworkError::RouterNotFound(name.to_string()))
    }
}
