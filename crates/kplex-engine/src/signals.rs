use std::io;
use std::sync::Arc;
use std::thread;

use kplex_topology::Topology;

/// Installs the SIGINT/SIGTERM handler: on either signal, sets the
/// topology's kill-all flag and wakes the reaper (§4.7's external shutdown
/// event). Runs on its own dedicated thread for the life of the process.
#[cfg(unix)]
pub fn install_shutdown_handler(topology: Arc<Topology>) -> io::Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    thread::Builder::new()
        .name("kplex-signals".to_string())
        .spawn(move || {
            for signal in signals.forever() {
                tracing::info!(signal, "shutdown requested");
                topology.request_kill_all();
            }
        })?;

    install_worker_cancellation_signal();
    Ok(())
}

#[cfg(not(unix))]
pub fn install_shutdown_handler(_topology: Arc<Topology>) -> io::Result<()> {
    Ok(())
}

/// Installs a process-wide no-op `SIGUSR1` handler. Without one, the
/// default disposition for `SIGUSR1` is to terminate the process, which
/// would turn `Interface::cancel`'s `pthread_kill` into an unplanned exit
/// instead of the `EINTR` a blocked worker thread is meant to observe.
#[cfg(unix)]
fn install_worker_cancellation_signal() {
    extern "C" fn no_op(_: libc::c_int) {}
    unsafe {
        libc::signal(libc::SIGUSR1, no_op as usize);
    }
}
