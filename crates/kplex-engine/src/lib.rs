//! The runtime that ties [`kplex_topology::Topology`] and
//! [`kplex_queue::BoundedQueue`] together: the engine's fan-out loop, the
//! per-interface worker bodies, the lifecycle reaper, and external signal
//! handling.

pub mod lifecycle;
pub mod signals;
pub mod worker;

pub use lifecycle::{spawn_input, spawn_output, spawn_engine, run_reaper};
pub use signals::install_shutdown_handler;
pub use worker::run_engine_loop;
