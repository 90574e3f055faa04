use std::collections::HashMap;

use crate::RouterId;
use crate::network::Topology;
use crate::protocol::{ForwardingTable, UNREACHABLE};

/// Computes the forwarding table of `source` over the whole topology.
///
/// Every link costs one hop. The unvisited router with the smallest
/// tentative distance is settled next, ties going to the earliest position,
/// and a neighbour only takes a new predecessor on a strictly shorter path.
/// This keeps the result deterministic for a given insertion order.
pub fn compute_forwarding_table(topology: &Topology, source: RouterId) -> ForwardingTable {
    let mut table = ForwardingTable::new();
    let Some(origin) = topology.get(&source) else {
        return table;
    };

    let order = topology.order();
    let positions: HashMap<RouterId, usize> = order
        .iter()
        .enumerate()
        .map(|(i, id)| (*id, i))
        .collect();
    let Some(&start) = positions.get(&source) else {
        return table;
    };

    let adjacency: Vec<Vec<usize>> = order
        .iter()
        .map(|id| {
            topology
                .get(id)
                .map(|router| {
                    router
                        .links
                        .iter()
                        .filter_map(|neighbor| positions.get(neighbor).copied())
                        .collect()
                })
                .unwrap_or_default()
        })
        .collect();

    let mut visited = vec![false; order.len()];
    let mut distances = vec![UNREACHABLE; order.len()];
    let mut previous: Vec<Option<usize>> = vec![None; order.len()];
    distances[start] = 0;

    while let Some(current) = closest_unvisited(&visited, &distances) {
        visited[current] = true;

        for &neighbor in &adjacency[current] {
            if visited[neighbor] {
                continue;
            }
            let candidate = distances[current] + 1;
            if candidate < distances[neighbor] {
                distances[neighbor] = candidate;
                previous[neighbor] = Some(current);
            }
        }
    }

    for (position, id) in order.iter().enumerate() {
        table.set_distance(*id, distances[position]);
        if position == start {
            continue;
        }

        let interface = find_next_hop(&previous, start, position)
            .and_then(|hop| origin.interface_to(&order[hop]));
        table.set_route(*id, interface);
    }

    table
}

fn closest_unvisited(visited: &[bool], distances: &[u32]) -> Option<usize> {
    let mut closest = None;
    let mut closest_distance = UNREACHABLE;

    for (position, &distance) in distances.iter().enumerate() {
        if !visited[position] && distance < closest_distance {
            closest = Some(position);
            closest_distance = distance;
        }
    }

    closest
}

/// Walks predecessors back from `dest` and returns the router adjacent to
/// `source` on that path.
fn find_next_hop(previous: &[Option<usize>], source: usize, dest: usize) -> Option<usize> {
    let mut current = dest;
    loop {
        match previous[current] {
            Some(prev) if prev == source => return Some(current),
            Some(prev) => current = prev,
            None => return None,
        }
    }
}
