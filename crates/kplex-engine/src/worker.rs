use std::sync::Arc;

use kplex_core::Senblk;
use kplex_queue::BoundedQueue;
use kplex_topology::{Interface, Topology};

/// The single fan-out consumer (§4.2). Pops sentences off `central` one at
/// a time and, holding the topology lock for the whole step, pushes a copy
/// onto every output queue except one paired with the sentence's source.
/// Exits once `central` reports deactivated-and-empty, having first
/// propagated that shutdown to every output queue.
pub fn run_engine_loop(topology: &Topology, central: &BoundedQueue<Senblk>) {
    loop {
        let sentence = central.pop();
        let done = sentence.is_none();
        topology.fan_out(sentence);
        if done {
            return;
        }
    }
}

/// The body of an input interface's worker thread (§4.3, §4.6). Claims the
/// interface's list slot, runs its transport's blocking read loop feeding
/// `central`, then unlinks. A transport error is logged and treated the
/// same as a clean EOF: the interface dies either way.
pub fn run_input_worker(topology: &Arc<Topology>, iface: &Arc<Interface>, central: &BoundedQueue<Senblk>) {
    if !topology.claim_slot(iface) {
        return;
    }

    if let Err(error) = iface.transport.run_input(iface, &mut |sb| central.push(sb)) {
        tracing::warn!(iface = %iface.id, %error, "input transport ended with error");
    }

    topology.unlink(iface);
}

/// The body of an output interface's worker thread. Claims its slot, drains
/// its own private queue through the transport's blocking write loop, then
/// unlinks. `next_senblk`'s `None` (queue deactivated) ends the loop the
/// same way a transport error or EOF would.
pub fn run_output_worker(topology: &Arc<Topology>, iface: &Arc<Interface>) {
    if !topology.claim_slot(iface) {
        return;
    }

    let queue = iface.queue.queue().clone();
    if let Err(error) = iface.transport.run_output(iface, &mut || queue.pop()) {
        tracing::warn!(iface = %iface.id, %error, "output transport ended with error");
    }

    topology.unlink(iface);
}
