//! End-to-end scenarios driving the fan-out engine, input/output workers
//! and the reaper together over mock transports, without any real serial
//! device or socket.

use std::io;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use kplex_core::Senblk;
use kplex_queue::BoundedQueue;
use kplex_topology::{Direction, Interface, InterfaceQueue, Topology, Transport};

use kplex_engine::{run_engine_loop, spawn_input, spawn_output};

/// Emits a fixed, pre-recorded list of sentences then returns as if the
/// transport hit EOF.
struct ScriptedInput {
    sentences: Vec<&'static str>,
}

impl Transport for ScriptedInput {
    fn run_input(&self, iface: &Interface, emit: &mut dyn FnMut(Senblk)) -> io::Result<()> {
        for s in &self.sentences {
            emit(Senblk::new(s.as_bytes(), iface.id));
        }
        Ok(())
    }
    fn run_output(
        &self,
        _iface: &Interface,
        _next: &mut dyn FnMut() -> Option<Senblk>,
    ) -> io::Result<()> {
        unreachable!("input-only mock")
    }
    fn cleanup(&self) {}
    fn description(&self) -> String {
        "scripted-input".into()
    }
}

/// Blocks (polling the cancellation flag) until cancelled, emitting nothing.
/// Stands in for a real serial/tcp read that only returns once the
/// interface is torn down externally.
struct BlockingInput;

impl Transport for BlockingInput {
    fn run_input(&self, iface: &Interface, _emit: &mut dyn FnMut(Senblk)) -> io::Result<()> {
        while !iface.is_cancelled() {
            thread::sleep(Duration::from_millis(5));
        }
        Ok(())
    }
    fn run_output(
        &self,
        _iface: &Interface,
        _next: &mut dyn FnMut() -> Option<Senblk>,
    ) -> io::Result<()> {
        unreachable!("input-only mock")
    }
    fn cleanup(&self) {}
    fn description(&self) -> String {
        "blocking-input".into()
    }
}

/// Drains its private queue into a shared `Vec` until deactivated.
struct CollectingOutput {
    collected: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl Transport for CollectingOutput {
    fn run_input(&self, _iface: &Interface, _emit: &mut dyn FnMut(Senblk)) -> io::Result<()> {
        unreachable!("output-only mock")
    }
    fn run_output(
        &self,
        _iface: &Interface,
        next: &mut dyn FnMut() -> Option<Senblk>,
    ) -> io::Result<()> {
        while let Some(sentence) = next() {
            self.collected.lock().unwrap().push(sentence.as_bytes().to_vec());
        }
        Ok(())
    }
    fn cleanup(&self) {}
    fn description(&self) -> String {
        "collecting-output".into()
    }
}

fn make_output(topology: &Arc<Topology>) -> (Arc<Interface>, Arc<Mutex<Vec<Vec<u8>>>>) {
    let collected = Arc::new(Mutex::new(Vec::new()));
    let q = BoundedQueue::new(8).unwrap();
    let iface = Interface::new(
        Direction::Out,
        Arc::new(CollectingOutput {
            collected: collected.clone(),
        }),
        InterfaceQueue::Dedicated(q),
        "out".into(),
    );
    topology.link_initialized(iface.clone());
    (iface, collected)
}

#[test]
fn fan_out_reaches_every_output_and_terminates_on_input_exit() {
    let topology = Topology::new();
    let central = BoundedQueue::new(8).unwrap();

    let input = Interface::new(
        Direction::In,
        Arc::new(ScriptedInput {
            sentences: vec!["$A*00\r\n", "$B*00\r\n"],
        }),
        InterfaceQueue::Central(central.clone()),
        "in".into(),
    );
    topology.link_initialized(input.clone());

    let (out1, collected1) = make_output(&topology);
    let (out2, collected2) = make_output(&topology);

    let engine_topology = topology.clone();
    let engine_central = central.clone();
    let engine_handle = thread::spawn(move || run_engine_loop(&engine_topology, &engine_central));
    let input_handle = spawn_input(topology.clone(), input.clone(), central.clone());
    let out1_handle = spawn_output(topology.clone(), out1);
    let out2_handle = spawn_output(topology.clone(), out2);

    input_handle.join().unwrap();
    engine_handle.join().unwrap();
    out1_handle.join().unwrap();
    out2_handle.join().unwrap();

    assert_eq!(collected1.lock().unwrap().len(), 2);
    assert_eq!(collected2.lock().unwrap().len(), 2);
}

#[test]
fn paired_output_does_not_receive_its_own_input() {
    let topology = Topology::new();
    let central = BoundedQueue::new(8).unwrap();

    let input = Interface::new(
        Direction::In,
        Arc::new(ScriptedInput {
            sentences: vec!["$LOOP*00\r\n"],
        }),
        InterfaceQueue::Central(central.clone()),
        "in".into(),
    );
    let (paired_out, paired_collected) = make_output(&topology);
    let (other_out, other_collected) = make_output(&topology);
    Interface::link_pair(&input, &paired_out);

    topology.link_initialized(input.clone());

    let engine_topology = topology.clone();
    let engine_central = central.clone();
    let engine_handle = thread::spawn(move || run_engine_loop(&engine_topology, &engine_central));
    let input_handle = spawn_input(topology.clone(), input.clone(), central.clone());
    let paired_handle = spawn_output(topology.clone(), paired_out);
    let other_handle = spawn_output(topology.clone(), other_out);

    input_handle.join().unwrap();
    engine_handle.join().unwrap();
    paired_handle.join().unwrap();
    other_handle.join().unwrap();

    assert!(paired_collected.lock().unwrap().is_empty());
    assert_eq!(other_collected.lock().unwrap().len(), 1);
}

#[test]
fn external_kill_cancels_a_blocked_input() {
    let topology = Topology::new();
    let central = BoundedQueue::new(8).unwrap();

    let input = Interface::new(
        Direction::In,
        Arc::new(BlockingInput),
        InterfaceQueue::Central(central.clone()),
        "blocked-in".into(),
    );
    topology.link_initialized(input.clone());
    let (out, _collected) = make_output(&topology);

    let engine_topology = topology.clone();
    let engine_central = central.clone();
    let engine_handle = thread::spawn(move || run_engine_loop(&engine_topology, &engine_central));
    let input_handle = spawn_input(topology.clone(), input.clone(), central.clone());
    let out_handle = spawn_output(topology.clone(), out);

    topology.wait_until_all_claimed();
    topology.request_kill_all();
    let dead = topology.reap_step();
    assert!(input.is_cancelled());
    drop(dead);

    // The blocking input now observes cancellation and exits; its unlink
    // deactivates the central queue, which cascades through the engine to
    // the output's queue and both remaining workers exit.
    input_handle.join().unwrap();
    engine_handle.join().unwrap();
    out_handle.join().unwrap();
}
