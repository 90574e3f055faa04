use serde::Serialize;

use crate::RouterId;
use crate::network::{Router, Topology};

/// Score added per recorded use of a link. After four packets a link costs
/// one extra hop, which is enough to tip traffic onto an equal alternate.
pub const USAGE_PENALTY: f64 = 0.25;

/// An exit interface considered for a packet, with its usage-adjusted score.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub interface: usize,
    pub neighbor: RouterId,
    pub score: f64,
}

/// A candidate resolved to the neighbour's name, for traces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateReport {
    pub interface: usize,
    pub neighbor: String,
    pub score: f64,
}

/// Lists the interfaces `router` may use to forward a packet towards `dst`.
///
/// The ideal interface from the forwarding table always comes first. Unless
/// the packet is high priority, every other neighbour whose own ideal route
/// to `dst` does not lead straight back to `router` is offered as well,
/// scored one hop more than the neighbour's distance. All scores are then
/// raised by the link's usage. Returns `None` when `router` has no route.
pub fn choose_exit_interface(
    topology: &Topology,
    router: &Router,
    dst: &RouterId,
    high_priority: bool,
) -> Option<Vec<Candidate>> {
    let ideal = router.forwarding.interface_for(dst)?;
    let ideal_neighbor = router.neighbor_at(ideal)?;

    let mut candidates = vec![(ideal, ideal_neighbor, router.forwarding.distance_to(dst))];

    if !high_priority {
        for (interface, neighbor_id) in router.links.iter().enumerate() {
            if interface == ideal {
                continue;
            }
            let Some(neighbor) = topology.get(neighbor_id) else {
                continue;
            };

            match neighbor.ideal_neighbor(dst) {
                Some(next) if next != router.id => {
                    let distance = neighbor.forwarding.distance_to(dst);
                    candidates.push((interface, *neighbor_id, distance.saturating_add(1)));
                }
                _ => {}
            }
        }
    }

    Some(
        candidates
            .into_iter()
            .map(|(interface, neighbor, distance)| {
                let times_used = topology.usage().lookup(router.id, neighbor).unwrap_or(0);
                Candidate {
                    interface,
                    neighbor,
                    score: f64::from(distance) + times_used as f64 * USAGE_PENALTY,
                }
            })
            .collect(),
    )
}

/// Lowest score wins; on a tie the earlier candidate is kept.
pub fn select_best(candidates: &[Candidate]) -> Option<&Candidate> {
    candidates.iter().fold(None, |best, candidate| match best {
        Some(current) if current.score <= candidate.score => Some(current),
        _ => Some(candidate),
    })
}
