use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Mutex;

use kplex_core::Senblk;
use kplex_framing::LineFramer;
use kplex_topology::{Interface, Transport};

use crate::{CANCEL_POLL, READ_CHUNK};

/// A single TCP connection carrying line-framed NMEA 0183 text, either
/// dialed out to a remote listener or accepted from one bound locally.
///
/// Unlike `flux-network`'s `mio`-driven, length-prefixed binary framing,
/// this is a blocking socket on its own thread: the engine's concurrency
/// model is thread-per-interface (§5), not a reactor multiplexing many
/// connections on one thread, and the wire format here is the same
/// `CR LF`-terminated text every other NMEA source uses. A read timeout
/// stands in for the `SIGUSR1`/`EINTR` cancellation path serial transports
/// use, since a timed-out read is portable across platforms where sending
/// a real signal to a blocked socket read is not.
pub struct TcpTransport {
    peer: SocketAddr,
    stream: Mutex<TcpStream>,
}

impl TcpTransport {
    pub fn connect(addr: SocketAddr) -> io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        Self::from_stream(stream)
    }

    /// Binds and accepts exactly one inbound connection; kplex's TCP server
    /// mode is simplified here to a single peer per configured interface
    /// rather than fanning multiple simultaneous clients into one queue.
    pub fn accept_one(bind_addr: SocketAddr) -> io::Result<Self> {
        let listener = TcpListener::bind(bind_addr)?;
        let (stream, _peer) = listener.accept()?;
        Self::from_stream(stream)
    }

    fn from_stream(stream: TcpStream) -> io::Result<Self> {
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(CANCEL_POLL))?;
        let peer = stream.peer_addr()?;
        Ok(TcpTransport {
            peer,
            stream: Mutex::new(stream),
        })
    }
}

impl Transport for TcpTransport {
    fn run_input(&self, iface: &Interface, emit: &mut dyn FnMut(Senblk)) -> io::Result<()> {
        let mut stream = self.stream.lock().unwrap();
        let mut framer = LineFramer::new();
        let mut buf = [0u8; READ_CHUNK];

        loop {
            if iface.is_cancelled() {
                return Ok(());
            }
            let n = match stream.read(&mut buf) {
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
                return Ok(());
            }
            framer.feed_all(&buf[..n], |sentence| emit(Senblk::new(sentence, iface.id)));
        }
    }

    fn run_output(
        &self,
        iface: &Interface,
        next: &mut dyn FnMut() -> Option<Senblk>,
    ) -> io::Result<()> {
        let mut stream = self.stream.lock().unwrap();
        while let Some(sentence) = next() {
            if iface.is_cancelled() {
                return Ok(());
            }
            if let Err(e) = stream.write_all(sentence.as_bytes()) {
                if e.kind() != io::ErrorKind::WouldBlock {
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    fn cleanup(&self) {
        let _ = self.stream.lock().unwrap().shutdown(std::net::Shutdown::Both);
    }

    fn description(&self) -> String {
        format!("tcp:{}", self.peer)
    }
}
