use std::collections::{HashMap, HashSet};

use custom_sdn::Topology;
use custom_sdn::config::{ControllerConfig, LinkConfig, RouterConfig};
use test_case::test_case;

fn topology(routers: &[&str], links: &[(&str, &str)]) -> Topology {
    ControllerConfig {
        routers: routers.iter().map(|n| RouterConfig::new(n, 0.0, 0.0)).collect(),
        links: links.iter().map(|(a, b)| LinkConfig::new(a, b)).collect(),
        hop_limit: None,
    }
    .build()
    .unwrap()
}

fn ring() -> Topology {
    topology(
        &["A", "B", "C", "D", "E"],
        &[("A", "B"), ("B", "C"), ("C", "D"), ("D", "E"), ("E", "A")],
    )
}

fn grid() -> Topology {
    let names: Vec<String> = (0..3)
        .flat_map(|r| (0..3).map(move |c| format!("G{r}{c}")))
        .collect();
    let mut links = Vec::new();
    for r in 0..3 {
        for c in 0..3 {
            if c < 2 {
                links.push((format!("G{r}{c}"), format!("G{r}{}", c + 1)));
            }
            if r < 2 {
                links.push((format!("G{r}{c}"), format!("G{}{c}", r + 1)));
            }
        }
    }
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    let links: Vec<(&str, &str)> = links.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();
    topology(&names, &links)
}

fn split() -> Topology {
    topology(
        &["A", "B", "C", "X", "Y"],
        &[("A", "B"), ("B", "C"), ("X", "Y")],
    )
}

fn demo() -> Topology {
    ControllerConfig::demo().build().unwrap()
}

#[test_case(ring(); "ring")]
#[test_case(grid(); "grid")]
#[test_case(split(); "split")]
#[test_case(demo(); "demo")]
fn test_distances_follow_next_hop(topology: Topology) {
    for router in topology.routers() {
        assert_eq!(router.forwarding.distance_to(&router.id), 0);

        for destination in topology.routers() {
            if destination.id == router.id || !router.forwarding.is_reachable(&destination.id) {
                continue;
            }
            let next = router
                .ideal_neighbor(&destination.id)
                .and_then(|id| topology.get(&id))
                .unwrap();
            assert_eq!(
                router.forwarding.distance_to(&destination.id),
                1 + next.forwarding.distance_to(&destination.id),
                "{} -> {} via {}",
                router.name,
                destination.name,
                next.name
            );
        }
    }
}

#[test_case(ring(); "ring")]
#[test_case(grid(); "grid")]
#[test_case(split(); "split")]
#[test_case(demo(); "demo")]
fn test_high_priority_follows_shortest_path(topology: Topology) {
    let names = topology.router_names();
    for src in &names {
        for dst in &names {
            let trace = topology.simulate_packet(src, dst, true).unwrap();
            match topology.distance(src, dst).unwrap() {
                Some(distance) => {
                    assert!(trace.is_delivered(), "{src} -> {dst}");
                    assert_eq!(trace.hops.len(), distance as usize);
                    let path = trace.path();
                    let unique: HashSet<_> = path.iter().collect();
                    assert_eq!(unique.len(), path.len(), "revisit on {path:?}");
                }
                None => assert!(!trace.is_delivered()),
            }
        }
    }
}

/// Destination → (neighbour name, distance) for every router.
fn resolved_tables(topology: &Topology) -> HashMap<String, Vec<(String, Option<String>, Option<u32>)>> {
    topology
        .router_names()
        .into_iter()
        .map(|name| {
            let mut rows: Vec<_> = topology
                .forwarding_table(&name)
                .unwrap()
                .into_iter()
                .map(|e| (e.destination, e.neighbor, e.distance))
                .collect();
            rows.sort();
            (name, rows)
        })
        .collect()
}

#[test]
fn test_remove_and_readd_restores_tables() {
    // A tree, so every shortest path is unique.
    let mut topology = topology(
        &["root", "left", "right", "l1", "l2", "r1"],
        &[
            ("root", "left"),
            ("root", "right"),
            ("left", "l1"),
            ("left", "l2"),
            ("right", "r1"),
        ],
    );
    let before = resolved_tables(&topology);

    topology.remove_router("left").unwrap();
    assert_eq!(topology.distance("root", "l1").unwrap(), None);

    topology.add_router("left", 0.0, 0.0).unwrap();
    for neighbor in ["root", "l1", "l2"] {
        topology.link_routers("left", neighbor).unwrap();
    }

    assert_eq!(resolved_tables(&topology), before);
}

#[test]
fn test_usage_only_grows_on_traversed_links() {
    let topology = demo();
    let pairs = [("R2", "R3"), ("R0", "R4"), ("R6", "R1"), ("R2", "R3"), ("R5", "R5")];

    for (i, (src, dst)) in pairs.iter().cycle().take(20).enumerate() {
        let before: HashMap<_, _> = topology
            .link_stats()
            .into_iter()
            .map(|s| ((s.a, s.b), s.times_used))
            .collect();

        let trace = topology.simulate_packet(src, dst, i % 3 == 0).unwrap();
        assert!(trace.is_delivered());

        let mut crossed: HashMap<(String, String), u64> = HashMap::new();
        for hop in &trace.hops {
            let key = if topology.link_stats().iter().any(|s| s.a == hop.router && s.b == hop.neighbor) {
                (hop.router.clone(), hop.neighbor.clone())
            } else {
                (hop.neighbor.clone(), hop.router.clone())
            };
            *crossed.entry(key).or_default() += 1;
        }

        for stats in topology.link_stats() {
            let key = (stats.a.clone(), stats.b.clone());
            let expected = before[&key] + crossed.get(&key).copied().unwrap_or(0);
            assert_eq!(stats.times_used, expected, "{key:?} after {src} -> {dst}");
        }
    }
}

#[test]
fn test_load_balancing_spreads_demo_traffic() {
    let topology = demo();

    // R2 -> R3 has one two-hop path (via R5) and two three-hop paths.
    let paths: Vec<_> = (0..6)
        .map(|_| topology.simulate_packet("R2", "R3", false).unwrap().path())
        .collect();
    assert!(paths.iter().take(4).all(|p| p == &["R2", "R5", "R3"]));
    assert!(paths.iter().any(|p| p.len() == 4), "no alternate taken: {paths:?}");

    for _ in 0..3 {
        let trace = topology.simulate_packet("R2", "R3", true).unwrap();
        assert_eq!(trace.path(), vec!["R2", "R5", "R3"]);
    }
}

#[test]
fn test_failed_unlink_changes_nothing() {
    let mut topology = demo();
    topology.simulate_packet("R0", "R3", false).unwrap();
    let tables = resolved_tables(&topology);
    let stats = topology.link_stats();

    assert!(topology.unlink_routers("R0", "R3").unwrap_err().is_not_found());

    assert_eq!(resolved_tables(&topology), tables);
    assert_eq!(topology.link_stats(), stats);
}
