use std::io;
use std::thread::spawn;

use kplex_core::Senblk;
use kplex_engine::{run_engine_loop, spawn_input, spawn_output};
use kplex_queue::BoundedQueue;
use kplex_topology::{Direction, Interface, InterfaceQueue, Topology, Transport};

struct FixedInput;
impl Transport for FixedInput {
    fn run_input(&self, iface: &Interface, emit: &mut dyn FnMut(Senblk)) -> io::Result<()> {
        emit(Senblk::new(b"$GPGGA,demo*00\r\n", iface.id));
        emit(Senblk::new(b"$GPRMC,demo*00\r\n", iface.id));
        Ok(())
    }
    fn run_output(&self, _iface: &Interface, _next: &mut dyn FnMut() -> Option<Senblk>) -> io::Result<()> {
        unreachable!("input-only")
    }
    fn cleanup(&self) {}
    fn description(&self) -> String {
        "demo-input".into()
    }
}

struct PrintingOutput;
impl Transport for PrintingOutput {
    fn run_input(&self, _iface: &Interface, _emit: &mut dyn FnMut(Senblk)) -> io::Result<()> {
        unreachable!("output-only")
    }
    fn run_output(&self, _iface: &Interface, next: &mut dyn FnMut() -> Option<Senblk>) -> io::Result<()> {
        while let Some(sentence) = next() {
            print!("{}", String::from_utf8_lossy(sentence.as_bytes()));
        }
        Ok(())
    }
    fn cleanup(&self) {}
    fn description(&self) -> String {
        "demo-output".into()
    }
}

fn main() {
    let topology = Topology::new();
    let central = BoundedQueue::new(8).unwrap();
    let out_queue = BoundedQueue::new(8).unwrap();

    let input = Interface::new(
        Direction::In,
        std::sync::Arc::new(FixedInput),
        InterfaceQueue::Central(central.clone()),
        "demo-input".into(),
    );
    let output = Interface::new(
        Direction::Out,
        std::sync::Arc::new(PrintingOutput),
        InterfaceQueue::Dedicated(out_queue),
        "demo-output".into(),
    );
    topology.link_initialized(input.clone());
    topology.link_initialized(output.clone());

    let engine_topology = topology.clone();
    let engine_central = central.clone();
    let engine = spawn(move || run_engine_loop(&engine_topology, &engine_central));
    let input_handle = spawn_input(topology.clone(), input, central);
    let output_handle = spawn_output(topology.clone(), output);

    input_handle.join().expect("join failed");
    engine.join().expect("join failed");
    output_handle.join().expect("join failed");
}
