use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Mutex;

use kplex_core::Senblk;
use kplex_framing::LineFramer;
use kplex_topology::{Interface, Transport};

use crate::{CANCEL_POLL, READ_CHUNK};

/// UDP broadcast, used for the LAN `broadcast` interface type: datagrams in
/// (`direction=in`) or out (`direction=out`) to a fixed broadcast address.
/// Each datagram is fed through the same line framer as a serial/tcp byte
/// stream rather than treated as one sentence per packet, since nothing in
/// the wire format guarantees a sender puts exactly one sentence per
/// datagram.
pub struct BroadcastTransport {
    addr: SocketAddr,
    socket: Mutex<UdpSocket>,
}

impl BroadcastTransport {
    pub fn bind_input(bind_addr: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(bind_addr)?;
        socket.set_read_timeout(Some(CANCEL_POLL))?;
        Ok(BroadcastTransport {
            addr: bind_addr,
            socket: Mutex::new(socket),
        })
    }

    pub fn bind_output(local_addr: SocketAddr, broadcast_addr: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(local_addr)?;
        socket.set_broadcast(true)?;
        socket.connect(broadcast_addr)?;
        Ok(BroadcastTransport {
            addr: broadcast_addr,
            socket: Mutex::new(socket),
        })
    }
}

impl Transport for BroadcastTransport {
    fn run_input(&self, iface: &Interface, emit: &mut dyn FnMut(Senblk)) -> io::Result<()> {
        let socket = self.socket.lock().unwrap();
        let mut framer = LineFramer::new();
        let mut buf = [0u8; READ_CHUNK];

        loop {
            if iface.is_cancelled() {
                return Ok(());
            }
            let n = match socket.recv(&mut buf) {
                Ok(n) => n,
                Err(ref e)
                    if e.kind() == io::ErrorKind::WouldBlock
                        || e.kind() == io::ErrorKind::TimedOut =>
                {
                    continue;
                }
                Err(e) => return Err(e),
            };
            if n == 0 {
                continue;
            }
            framer.feed_all(&buf[..n], |sentence| emit(Senblk::new(sentence, iface.id)));
        }
    }

    fn run_output(
        &self,
        iface: &Interface,
        next: &mut dyn FnMut() -> Option<Senblk>,
    ) -> io::Result<()> {
        let socket = self.socket.lock().unwrap();
        while let Some(sentence) = next() {
            if iface.is_cancelled() {
                return Ok(());
            }
            socket.send(sentence.as_bytes())?;
        }
        Ok(())
    }

    fn cleanup(&self) {}

    fn description(&self) -> String {
        format!("broadcast:{}", self.addr)
    }
}
