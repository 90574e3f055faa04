pub mod router_config;

pub use router_config::{LinkConfig, RouterConfig};

use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::network::Topology;

/// Startup topology of the controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    #[serde(default)]
    pub routers: Vec<RouterConfig>,
    #[serde(default)]
    pub links: Vec<LinkConfig>,
    /// Overrides the default hop ceiling (the router count) for simulations.
    #[serde(default)]
    pub hop_limit: Option<usize>,
}

impl ControllerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: ControllerConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Seven routers with three routes between R2 and R3 to exercise load balancing.
    pub fn demo() -> Self {
        let routers = [
            ("R0", -2.0, -2.0),
            ("R1", 2.0, -2.0),
            ("R2", -2.0, 2.0),
            ("R3", 3.0, 0.0),
            ("R4", 3.0, 3.0),
            ("R5", 0.0, 0.5),
            ("R6", 0.0, 3.0),
        ];
        let links = [
            ("R0", "R1"),
            ("R0", "R2"),
            ("R1", "R3"),
            ("R2", "R6"),
            ("R6", "R4"),
            ("R4", "R3"),
            ("R2", "R5"),
            ("R5", "R3"),
        ];

        Self {
            routers: routers
                .iter()
                .map(|(name, x, y)| RouterConfig::new(name, *x, *y))
                .collect(),
            links: links.iter().map(|(a, b)| LinkConfig::new(a, b)).collect(),
            hop_limit: None,
        }
    }

    /// Builds the topology, computing forwarding tables once at the end.
    pub fn build(&self) -> crate::Result<Topology> {
        let mut topology = Topology::new();
        for router in &self.routers {
            topology.insert_router(&router.name, router.x, router.y)?;
        }
        for LinkConfig(a, b) in &self.links {
            topology.insert_link(a, b)?;
        }
        topology.set_hop_limit(self.hop_limit);
        topology.recompute();

        info!(
            "Built topology with {} routers and {} links",
            topology.len(),
            topology.link_count()
        );
        Ok(topology)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NetworkError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "routers": [{{"name": "A", "x": 1.5, "y": -1}}, {{"name": "B"}}],
                "links": [["A", "B"]],
                "hop_limit": 8
            }}"#
        )
        .unwrap();

        let config = ControllerConfig::load(file.path()).unwrap();
        assert_eq!(config.routers[0], RouterConfig::new("A", 1.5, -1.0));
        assert_eq!(config.routers[1], RouterConfig::new("B", 0.0, 0.0));
        assert_eq!(config.links, vec![LinkConfig::new("A", "B")]);

        let topology = config.build().unwrap();
        assert_eq!(topology.hop_limit(), 8);
        assert_eq!(topology.distance("A", "B").unwrap(), Some(1));
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ routers: ").unwrap();
        assert!(ControllerConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_demo_topology() {
        let topology = ControllerConfig::demo().build().unwrap();
        assert_eq!(topology.len(), 7);
        assert_eq!(topology.link_count(), 8);
        assert_eq!(topology.distance("R2", "R3").unwrap(), Some(2));
        assert_eq!(topology.distance("R0", "R4").unwrap(), Some(3));
    }

    #[test]
    fn test_build_rejects_unknown_link_endpoint() {
        let config = ControllerConfig {
            routers: vec![RouterConfig::new("A", 0.0, 0.0)],
            links: vec![LinkConfig::new("A", "ghost")],
            hop_limit: None,
        };
        assert_eq!(
            config.build().unwrap_err(),
            NetworkError::RouterNotFound("ghost".to_string())
        );
    }
}
