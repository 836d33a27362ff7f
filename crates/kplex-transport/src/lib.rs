//! Concrete [`kplex_topology::Transport`] implementations for each interface
//! type named in the configuration grammar: `file`, `serial`, `seatalk`,
//! `pty`, `tcp`, `broadcast`.
//!
//! Every transport here is blocking, thread-per-interface I/O, matching the
//! engine's thread model (`kplex-topology`): a worker thread calls
//! `run_input`/`run_output` exactly once and the call is expected to occupy
//! that thread until it returns.

mod broadcast;
mod file;
mod pty;
mod seatalk;
mod serial;
mod tcp;

pub use broadcast::BroadcastTransport;
pub use file::FileTransport;
pub use pty::{PtyMode, PtyTransport};
pub use seatalk::SeatalkTransport;
pub use serial::{Baud, SerialTransport};
pub use tcp::TcpTransport;

/// Shared chunk size for stream-style reads (file, serial, pty, tcp); mirrors
/// the original's `BUFSIZ`-sized read buffer in `read_serial`/`read_file`.
pub(crate) const READ_CHUNK: usize = 1024;

/// How long a cancellable read waits before re-checking
/// `iface.is_cancelled()`. Transports that support a socket or file
/// read-timeout (tcp, broadcast, regular files) poll on this interval
/// instead of relying on signal delivery, since `SIGUSR1` delivery is only
/// guaranteed to interrupt a syscall that is actually blocked in the kernel
/// at the moment the signal arrives.
pub(crate) const CANCEL_POLL: std::time::Duration = std::time::Duration::from_millis(250);
