//! The interface record, the four-list topology, and the `Transport` seam
//! between the engine and the per-transport I/O crate.

mod interface;
mod topology;
mod transport;

pub use interface::{Direction, Interface, InterfaceQueue};
pub use topology::Topology;
pub use transport::Transport;
