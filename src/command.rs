//! Text commands understood by the prompt and the control server.
//!
//! A command line is a whitespace separated list of words: the command name
//! followed by its arguments, e.g. `link R0 R1` or `simulate R2 R3`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;
use thiserror::Error;

use crate::SharedTopology;
use crate::error::NetworkError;
use crate::network::LinkStats;
use crate::protocol::{ForwardingEntry, Outcome, PacketTrace};

pub const COMMANDS: &[(&str, &str)] = &[
    ("add <name> <x> <y>", "Add a router at position (x, y)"),
    ("rem <name>", "Remove a router and its links"),
    ("link <a> <b>", "Link two routers"),
    ("unlink <a> <b>", "Remove the link between two routers"),
    ("print <name>", "Show the interfaces and forwarding table of a router"),
    ("simulate <src> <dst>", "Send a load-balanced packet"),
    ("simulate_high_priority <src> <dst>", "Send a packet along the shortest path only"),
    ("stats", "Show how often each link was used"),
    ("status", "Show topology size and last recompute time"),
    ("help", "Show this help message"),
    ("quit", "Stop the controller"),
];

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Add { name: String, x: f64, y: f64 },
    Remove { name: String },
    Link { a: String, b: String },
    Unlink { a: String, b: String },
    Print { name: String },
    Simulate { src: String, dst: String, high_priority: bool },
    Stats,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),
}

impl Command {
    pub fn parse_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Self, CommandError> {
        let words: Vec<&str> = tokens.iter().map(|t| t.as_ref()).collect();
        let Some((&name, args)) = words.split_first() else {
            return Err(CommandError::Empty);
        };

        let command = match (name, args) {
            ("add", [router, x, y]) => Command::Add {
                name: router.to_string(),
                x: parse_coordinate(x)?,
                y: parse_coordinate(y)?,
            },
            ("add", _) => return Err(CommandError::Usage("add <name> <x> <y>")),
            ("rem" | "remove", [router]) => Command::Remove {
                name: router.to_string(),
            },
            ("rem" | "remove", _) => return Err(CommandError::Usage("rem <name>")),
            ("link", [a, b]) => Command::Link {
                a: a.to_string(),
                b: b.to_string(),
            },
            ("link", _) => return Err(CommandError::Usage("link <a> <b>")),
            ("unlink", [a, b]) => Command::Unlink {
                a: a.to_string(),
                b: b.to_string(),
            },
            ("unlink", _) => return Err(CommandError::Usage("unlink <a> <b>")),
            ("print", [router]) => Command::Print {
                name: router.to_string(),
            },
            ("print", _) => return Err(CommandError::Usage("print <name>")),
            ("simulate", [src, dst]) => Command::Simulate {
                src: src.to_string(),
                dst: dst.to_string(),
                high_priority: false,
            },
            ("simulate", _) => return Err(CommandError::Usage("simulate <src> <dst>")),
            ("simulate_high_priority", [src, dst]) => Command::Simulate {
                src: src.to_string(),
                dst: dst.to_string(),
                high_priority: true,
            },
            ("simulate_high_priority", _) => {
                return Err(CommandError::Usage("simulate_high_priority <src> <dst>"));
            }
            ("stats", _) => Command::Stats,
            ("status", _) => Command::Status,
            ("help", _) => Command::Help,
            ("quit" | "exit", _) => Command::Quit,
            (other, _) => return Err(CommandError::Unknown(other.to_string())),
        };

        Ok(command)
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        Self::parse_tokens(&tokens)
    }
}

fn parse_coordinate(value: &str) -> Result<f64, CommandError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CommandError::InvalidCoordinate(value.to_string()))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouterReport {
    pub name: String,
    pub interfaces: Vec<InterfaceReport>,
    pub forwarding_table: Vec<ForwardingEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceReport {
    pub interface: usize,
    pub neighbor: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub routers: usize,
    pub links: usize,
    pub link_uses: u64,
    pub hop_limit: usize,
    pub recomputed_at: DateTime<Utc>,
}

/// Result of a successfully executed command.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Updated(String),
    Router(RouterReport),
    Trace(PacketTrace),
    Stats(Vec<LinkStats>),
    Status(StatusReport),
    Help,
    Quit,
}

/// Runs a command against the shared topology.
///
/// Mutations hold the write lock across the change and the recompute that
/// follows it; everything else only reads.
pub async fn execute(command: Command, state: &SharedTopology) -> Result<Reply, NetworkError> {
    debug!("Executing {:?}", command);

    let reply = match command {
        Command::Add { name, x, y } => {
            state.write().await.add_router(&name, x, y)?;
            Reply::Updated(format!("Added router {name}"))
        }
        Command::Remove { name } => {
            state.write().await.remove_router(&name)?;
            Reply::Updated(format!("Removed router {name}"))
        }
        Command::Link { a, b } => {
            let created = state.write().await.link_routers(&a, &b)?;
            if created {
                Reply::Updated(format!("Linked {a} <-> {b}"))
            } else {
                Reply::Updated(format!("No new link between {a} and {b}"))
            }
        }
        Command::Unlink { a, b } => {
            state.write().await.unlink_routers(&a, &b)?;
            Reply::Updated(format!("Unlinked {a} <-> {b}"))
        }
        Command::Print { name } => {
            let topology = state.read().await;
            let interfaces = topology
                .interfaces(&name)?
                .into_iter()
                .map(|(interface, neighbor)| InterfaceReport { interface, neighbor })
                .collect();
            Reply::Router(RouterReport {
                forwarding_table: topology.forwarding_table(&name)?,
                name,
                interfaces,
            })
        }
        Command::Simulate { src, dst, high_priority } => {
            let trace = state.read().await.simulate_packet(&src, &dst, high_priority)?;
            Reply::Trace(trace)
        }
        Command::Stats => Reply::Stats(state.read().await.link_stats()),
        Command::Status => {
            let topology = state.read().await;
            Reply::Status(StatusReport {
                routers: topology.len(),
                links: topology.link_count(),
                link_uses: topology.usage().iter().map(|(_, uses)| uses).sum(),
                hop_limit: topology.hop_limit(),
                recomputed_at: topology.recomputed_at(),
            })
        }
        Command::Help => Reply::Help,
        Command::Quit => Reply::Quit,
    };

    Ok(reply)
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Updated(message) => write!(f, "{message}"),
            Reply::Router(report) => write!(f, "{report}"),
            Reply::Trace(trace) => write_trace(f, trace),
            Reply::Stats(stats) => {
                writeln!(f, "Link usage:")?;
                for link in stats {
                    writeln!(f, "\t{} <-> {}: {}", link.a, link.b, link.times_used)?;
                }
                Ok(())
            }
            Reply::Status(status) => write!(
                f,
                "{} routers, {} links, {} link uses, hop limit {}, tables computed at {}",
                status.routers,
                status.links,
                status.link_uses,
                status.hop_limit,
                status.recomputed_at.format("%Y-%m-%d %H:%M:%S")
            ),
            Reply::Help => {
                writeln!(f, "Available commands:")?;
                for (usage, description) in COMMANDS {
                    writeln!(f, "\t{usage:<36} {description}")?;
                }
                Ok(())
            }
            Reply::Quit => write!(f, "Bye"),
        }
    }
}

impl fmt::Display for RouterReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Links for node {}:", self.name)?;
        for entry in &self.interfaces {
            writeln!(f, "\tinterface {}: {}", entry.interface, entry.neighbor)?;
        }

        writeln!(f, "FWD table for node {}:", self.name)?;
        for entry in &self.forwarding_table {
            match (entry.interface, &entry.neighbor, entry.distance) {
                (Some(interface), Some(neighbor), Some(distance)) => writeln!(
                    f,
                    "\t{} -> interface {} (node {}), {} hop(s)",
                    entry.destination, interface, neighbor, distance
                )?,
                _ => writeln!(f, "\t{} -> no route", entry.destination)?,
            }
        }
        Ok(())
    }
}

fn write_trace(f: &mut fmt::Formatter<'_>, trace: &PacketTrace) -> fmt::Result {
    writeln!(f, "Routing packet from {} -> {}", trace.source, trace.destination)?;
    for hop in &trace.hops {
        writeln!(f, "{}:", hop.router)?;
        writeln!(f, "\tLink weights (choosing smallest):")?;
        for candidate in &hop.candidates {
            writeln!(
                f,
                "\t\t{} ({}): {}",
                candidate.interface, candidate.neighbor, candidate.score
            )?;
        }
        writeln!(
            f,
            "\tSending packet through interface {} ({})...",
            hop.interface, hop.neighbor
        )?;
    }

    match &trace.outcome {
        Outcome::Delivered => write!(f, "Finished!"),
        Outcome::Failed(error) => write!(f, "Failed: {error}"),
    }
}
