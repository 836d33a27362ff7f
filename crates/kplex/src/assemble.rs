//! Turns a [`kplex_config::ResolvedConfig`] into a live [`Topology`] plus
//! the engine's central queue — the transport-construction half of the
//! original `main`'s interface initialization loop (the part before
//! `init_serial`/`init_tcp`/… hand off to a pthread).

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};

use kplex_config::{Direction as CfgDirection, InterfaceSpec, InterfaceType, ResolvedConfig};
use kplex_core::Senblk;
use kplex_queue::BoundedQueue;
use kplex_topology::{Direction, Interface, InterfaceQueue, Topology, Transport};
use kplex_transport::{
    Baud, BroadcastTransport, FileTransport, PtyMode, PtyTransport, SeatalkTransport,
    SerialTransport, TcpTransport,
};

/// Every interface built from the configuration, plus the topology and
/// central queue they were linked into.
pub struct Built {
    pub topology: Arc<Topology>,
    pub central: BoundedQueue<Senblk>,
    pub interfaces: Vec<Arc<Interface>>,
}

/// Builds every configured interface and links it onto `topology.initialized`.
/// On the first failure, runs `cleanup` on every transport built so far —
/// mirroring §7's "resource failures during per-interface initialization
/// mark the whole start-up as failed and tear down already-initialized
/// interfaces before exit" — then returns the error.
pub fn build(resolved: &ResolvedConfig) -> Result<Built> {
    let central = BoundedQueue::new(resolved.qsize)?;
    let topology = Topology::new();
    let mut interfaces: Vec<Arc<Interface>> = Vec::new();

    for spec in &resolved.interfaces {
        match build_one(spec, &central) {
            Ok(built) => interfaces.extend(built),
            Err(err) => {
                for iface in &interfaces {
                    iface.transport.cleanup();
                }
                return Err(err);
            }
        }
    }

    for iface in &interfaces {
        topology.link_initialized(iface.clone());
    }

    Ok(Built {
        topology,
        central,
        interfaces,
    })
}

fn build_one(spec: &InterfaceSpec, central: &BoundedQueue<Senblk>) -> Result<Vec<Arc<Interface>>> {
    match spec.itype {
        InterfaceType::File => build_file(spec, central),
        InterfaceType::Serial => build_serial(spec, central),
        InterfaceType::Seatalk => build_seatalk(spec, central),
        InterfaceType::Pty => build_pty(spec, central),
        InterfaceType::Tcp => build_tcp(spec, central),
        InterfaceType::Broadcast => build_broadcast(spec, central),
    }
}

fn option<'a>(spec: &'a InterfaceSpec, key: &str) -> Option<&'a str> {
    spec.options.get(key).map(String::as_str)
}

fn required<'a>(spec: &'a InterfaceSpec, key: &str) -> Result<&'a str> {
    option(spec, key).ok_or_else(|| anyhow!("missing required option '{key}'"))
}

fn baud_option(spec: &InterfaceSpec) -> Result<Baud> {
    match option(spec, "baud") {
        Some(val) => Baud::parse(val).ok_or_else(|| anyhow!("invalid baud rate '{val}'")),
        None => Ok(Baud::default()),
    }
}

fn out_queue(spec: &InterfaceSpec) -> Result<BoundedQueue<Senblk>> {
    let qsize = match option(spec, "qsize") {
        Some(val) => val
            .parse()
            .with_context(|| format!("invalid qsize '{val}'"))?,
        None => kplex_core::DEFSERIALQSIZE,
    };
    Ok(BoundedQueue::new(qsize)?)
}

fn socket_addr(host: &str, port: &str) -> Result<SocketAddr> {
    let port: u16 = port
        .parse()
        .with_context(|| format!("invalid port '{port}'"))?;
    format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid address '{host}:{port}'"))
}

fn cfg_direction(spec: &InterfaceSpec) -> CfgDirection {
    spec.direction
        .expect("InterfaceSpec::finish guarantees direction is set")
}

/// Builds the single, non-paired `In`/`Out` interface that every transport
/// except `serial` supports — `direction=both` is rejected at this level
/// for everything that isn't `serial`, since every other transport here
/// holds its file descriptor behind one `Mutex` locked for the whole
/// blocking read or write loop; sharing it between an `In` and an `Out`
/// worker thread the way paired serial lines do would deadlock one thread
/// against the other (see DESIGN.md).
fn single_direction(spec: &InterfaceSpec, itype_name: &str) -> Result<Direction> {
    match cfg_direction(spec) {
        CfgDirection::In => Ok(Direction::In),
        CfgDirection::Out => Ok(Direction::Out),
        CfgDirection::Both => bail!("{itype_name} interfaces do not support direction=both"),
    }
}

fn wrap(
    direction: Direction,
    transport: Arc<dyn Transport>,
    central: &BoundedQueue<Senblk>,
    private_queue: Option<BoundedQueue<Senblk>>,
) -> Result<Arc<Interface>> {
    let queue = match direction {
        Direction::In => InterfaceQueue::Central(central.clone()),
        Direction::Out => InterfaceQueue::Dedicated(
            private_queue.ok_or_else(|| anyhow!("output interface missing its private queue"))?,
        ),
    };
    let description = transport.description();
    Ok(Interface::new(direction, transport, queue, description))
}

fn build_file(spec: &InterfaceSpec, central: &BoundedQueue<Senblk>) -> Result<Vec<Arc<Interface>>> {
    let filename = required(spec, "filename")?;
    let direction = single_direction(spec, "file")?;
    let private_queue = matches!(direction, Direction::Out)
        .then(|| out_queue(spec))
        .transpose()?;
    let transport: Arc<dyn Transport> = Arc::new(
        FileTransport::new(filename, direction)
            .with_context(|| format!("opening file interface '{filename}'"))?,
    );
    Ok(vec![wrap(direction, transport, central, private_queue)?])
}

fn build_serial(spec: &InterfaceSpec, central: &BoundedQueue<Senblk>) -> Result<Vec<Arc<Interface>>> {
    let filename = required(spec, "filename")?;
    let baud = baud_option(spec)?;

    if cfg_direction(spec) == CfgDirection::Both {
        let transport: Arc<dyn Transport> = Arc::new(
            SerialTransport::open_paired(filename, baud)
                .with_context(|| format!("opening serial interface '{filename}'"))?,
        );
        let out_q = out_queue(spec)?;
        let input = wrap(Direction::In, transport.clone(), central, None)?;
        let output = wrap(Direction::Out, transport, central, Some(out_q))?;
        Interface::link_pair(&input, &output);
        return Ok(vec![input, output]);
    }

    let direction = single_direction(spec, "serial")?;
    let private_queue = matches!(direction, Direction::Out)
        .then(|| out_queue(spec))
        .transpose()?;
    let transport: Arc<dyn Transport> = Arc::new(
        SerialTransport::open(filename, direction, baud)
            .with_context(|| format!("opening serial interface '{filename}'"))?,
    );
    Ok(vec![wrap(direction, transport, central, private_queue)?])
}

fn build_seatalk(spec: &InterfaceSpec, central: &BoundedQueue<Senblk>) -> Result<Vec<Arc<Interface>>> {
    if cfg_direction(spec) != CfgDirection::In {
        bail!("seatalk interfaces are input-only: direction must be 'in'");
    }
    let filename = required(spec, "filename")?;
    let baud = baud_option(spec)?;
    let transport: Arc<dyn Transport> = Arc::new(
        SeatalkTransport::open(filename, baud)
            .with_context(|| format!("opening seatalk interface '{filename}'"))?,
    );
    Ok(vec![wrap(Direction::In, transport, central, None)?])
}

fn build_pty(spec: &InterfaceSpec, central: &BoundedQueue<Senblk>) -> Result<Vec<Arc<Interface>>> {
    let mode = match option(spec, "mode") {
        Some(m) if m.eq_ignore_ascii_case("master") => PtyMode::Master,
        Some(m) if m.eq_ignore_ascii_case("slave") => PtyMode::Slave,
        Some(other) => bail!("invalid pty mode '{other}'"),
        None => PtyMode::Master,
    };
    let filename = option(spec, "filename").map(std::path::Path::new);
    let baud = baud_option(spec)?;
    let direction = single_direction(spec, "pty")?;
    let private_queue = matches!(direction, Direction::Out)
        .then(|| out_queue(spec))
        .transpose()?;
    let transport: Arc<dyn Transport> = Arc::new(
        PtyTransport::open(mode, filename, baud).context("opening pty interface")?,
    );
    Ok(vec![wrap(direction, transport, central, private_queue)?])
}

fn build_tcp(spec: &InterfaceSpec, central: &BoundedQueue<Senblk>) -> Result<Vec<Arc<Interface>>> {
    let address = required(spec, "address")?;
    let port = required(spec, "port")?;
    let addr = socket_addr(address, port)?;
    let server = option(spec, "mode")
        .map(|m| m.eq_ignore_ascii_case("server"))
        .unwrap_or(false);

    let direction = single_direction(spec, "tcp")?;
    let private_queue = matches!(direction, Direction::Out)
        .then(|| out_queue(spec))
        .transpose()?;
    let transport: Arc<dyn Transport> = Arc::new(if server {
        TcpTransport::accept_one(addr).with_context(|| format!("accepting tcp connection on {addr}"))?
    } else {
        TcpTransport::connect(addr).with_context(|| format!("connecting to tcp {addr}"))?
    });
    Ok(vec![wrap(direction, transport, central, private_queue)?])
}

fn build_broadcast(spec: &InterfaceSpec, central: &BoundedQueue<Senblk>) -> Result<Vec<Arc<Interface>>> {
    let port = required(spec, "port")?;
    let direction = single_direction(spec, "broadcast")?;
    let private_queue = matches!(direction, Direction::Out)
        .then(|| out_queue(spec))
        .transpose()?;

    let transport: Arc<dyn Transport> = match direction {
        Direction::In => {
            let bind_host = option(spec, "address").unwrap_or("0.0.0.0");
            let bind_addr = socket_addr(bind_host, port)?;
            Arc::new(
                BroadcastTransport::bind_input(bind_addr)
                    .with_context(|| format!("binding broadcast input on {bind_addr}"))?,
            )
        }
        Direction::Out => {
            let broadcast_host = required(spec, "address")?;
            let broadcast_addr = socket_addr(broadcast_host, port)?;
            let local_addr: SocketAddr = "0.0.0.0:0".parse().unwrap();
            Arc::new(
                BroadcastTransport::bind_output(local_addr, broadcast_addr)
                    .with_context(|| format!("binding broadcast output to {broadcast_addr}"))?,
            )
        }
    };
    Ok(vec![wrap(direction, transport, central, private_queue)?])
}
