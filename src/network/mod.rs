pub mod link;
pub mod router;
pub mod topology;

pub use link::{LinkKey, LinkUsage};
pub use router::Router;
pub use topology::{LinkStats, Topology};
