use std::sync::Arc;
use std::thread::{self, JoinHandle};

use kplex_core::Senblk;
use kplex_queue::BoundedQueue;
use kplex_topology::{Interface, Topology};

use crate::worker::{run_engine_loop, run_input_worker, run_output_worker};

/// Spawns an input interface's worker thread, mirroring `init_*`'s handoff
/// of `ifa` to its own pthread in the original.
pub fn spawn_input(
    topology: Arc<Topology>,
    iface: Arc<Interface>,
    central: BoundedQueue<Senblk>,
) -> JoinHandle<()> {
    thread::Builder::new()
        .name(format!("kplex-in-{}", iface.id))
        .spawn(move || run_input_worker(&topology, &iface, &central))
        .expect("failed to spawn input worker thread")
}

/// Spawns an output interface's worker thread.
pub fn spawn_output(topology: Arc<Topology>, iface: Arc<Interface>) -> JoinHandle<()> {
    thread::Builder::new()
        .name(format!("kplex-out-{}", iface.id))
        .spawn(move || run_output_worker(&topology, &iface))
        .expect("failed to spawn output worker thread")
}

/// Spawns the fan-out engine thread over the central queue.
pub fn spawn_engine(topology: Arc<Topology>, central: BoundedQueue<Senblk>) -> JoinHandle<()> {
    thread::Builder::new()
        .name("kplex-engine".to_string())
        .spawn(move || run_engine_loop(&topology, &central))
        .expect("failed to spawn engine thread")
}

/// The lifecycle controller's reaper loop (§4.6): repeatedly calls
/// [`Topology::reap_step`] and logs each interface as it's reaped, until
/// nothing remains on `inputs`, `outputs`, or `dead`. Runs on the thread
/// that calls it — callers that want this in the background should spawn
/// it themselves, the way `main` spawns the signal-handling thread
/// alongside it.
pub fn run_reaper(topology: &Topology) {
    while topology.remaining() {
        for iface in topology.reap_step() {
            tracing::info!(iface = %iface.id, description = %iface.transport.description(), "interface reaped");
        }
    }
}
