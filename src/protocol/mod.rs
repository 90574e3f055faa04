//! Forwarding decisions and packet traversal over a computed topology.

pub mod forwarding;
pub mod routing_table;
pub mod simulator;

pub use forwarding::{Candidate, CandidateReport, USAGE_PENALTY, choose_exit_interface, select_best};
pub use routing_table::{ForwardingEntry, ForwardingTable, UNREACHABLE};
pub use simulator::{HopEvent, Outcome, PacketTrace};
