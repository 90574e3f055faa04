use log::{debug, info, warn};
use serde::Serialize;

use crate::error::{NetworkError, Result};
use crate::network::Topology;
use crate::protocol::forwarding::{CandidateReport, choose_exit_interface, select_best};

/// One forwarding decision taken by a simulated packet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HopEvent {
    pub router: String,
    pub interface: usize,
    pub neighbor: String,
    pub score: f64,
    pub candidates: Vec<CandidateReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum Outcome {
    Delivered,
    Failed(NetworkError),
}

/// The hops a packet took and how its journey ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PacketTrace {
    pub source: String,
    pub destination: String,
    pub high_priority: bool,
    pub hops: Vec<HopEvent>,
    pub outcome: Outcome,
}

impl PacketTrace {
    pub fn is_delivered(&self) -> bool {
        self.outcome == Outcome::Delivered
    }

    /// Routers visited, source first.
    pub fn path(&self) -> Vec<String> {
        std::iter::once(self.source.clone())
            .chain(self.hops.iter().map(|hop| hop.neighbor.clone()))
            .collect()
    }

    pub fn into_result(self) -> Result<Vec<HopEvent>> {
        match self.outcome {
            Outcome::Delivered => Ok(self.hops),
            Outcome::Failed(error) => Err(error),
        }
    }
}

impl Topology {
    /// Walks a packet from `src` to `dst` one forwarding decision at a time,
    /// counting a use on every link it crosses.
    ///
    /// Unknown routers are reported as an error. Routing failures end the walk
    /// and are recorded in the trace's outcome alongside the hops taken so far.
    pub fn simulate_packet(&self, src: &str, dst: &str, high_priority: bool) -> Result<PacketTrace> {
        let mut current = self.id_of(src)?;
        let destination = self.id_of(dst)?;
        let hop_limit = self.hop_limit();

        info!(
            "Routing {} packet from {} -> {}",
            if high_priority { "high priority" } else { "normal" },
            src,
            dst
        );

        let mut trace = PacketTrace {
            source: src.to_string(),
            destination: dst.to_string(),
            high_priority,
            hops: Vec::new(),
            outcome: Outcome::Delivered,
        };

        while current != destination {
            if trace.hops.len() >= hop_limit {
                warn!("Packet {} -> {} exceeded {} hops", src, dst, hop_limit);
                trace.outcome = Outcome::Failed(NetworkError::RoutingLoop {
                    hops: trace.hops.len(),
                });
                return Ok(trace);
            }

            let Some(router) = self.get(&current) else {
                trace.outcome = Outcome::Failed(NetworkError::RouterNotFound(current.to_string()));
                return Ok(trace);
            };

            let candidates = choose_exit_interface(self, router, &destination, high_priority)
                .unwrap_or_default();
            let Some(best) = select_best(&candidates) else {
                warn!("No path from {} to {}", router.name, dst);
                trace.outcome = Outcome::Failed(NetworkError::NoRoute {
                    from: router.name.clone(),
                    to: dst.to_string(),
                });
                return Ok(trace);
            };

            let reports: Vec<CandidateReport> = candidates
                .iter()
                .map(|candidate| CandidateReport {
                    interface: candidate.interface,
                    neighbor: self.name_of(&candidate.neighbor).unwrap_or_default().to_string(),
                    score: candidate.score,
                })
                .collect();

            if self.usage().record_use(router.id, best.neighbor).is_none() {
                debug!("No usage entry for interface {} of {}", best.interface, router.name);
            }

            let neighbor = self.name_of(&best.neighbor).unwrap_or_default().to_string();
            debug!(
                "{}: sending through interface {} ({}) score {}",
                router.name, best.interface, neighbor, best.score
            );

            trace.hops.push(HopEvent {
                router: router.name.clone(),
                interface: best.interface,
                neighbor,
                score: best.score,
                candidates: reports,
            });
            current = best.neighbor;
        }

        info!("Packet {} -> {} delivered in {} hops", src, dst, trace.hops.len());
        Ok(trace)
    }
}
