use crate::Interface;
use kplex_core::Senblk;

/// The contract between a runtime interface and its transport-specific I/O.
///
/// The core only ever calls one of `run_input`/`run_output`, chosen by
/// `Interface::direction`, exactly once, from the interface's dedicated
/// worker thread. The callback returns when the transport hits EOF, a
/// fatal error, or observes `iface.is_cancelled()`; the worker then calls
/// `cleanup` and unlinks the interface.
///
/// This trait is the Rust re-expression of the original's
/// `read`/`write`/`cleanup` function pointers stored directly on
/// `iface_t`; keeping it as a trait object on [`Interface`] rather than
/// three separate fields groups the three callables with the data they
/// close over, which a bare fn pointer plus a `void *info` cannot do
/// safely.
pub trait Transport: Send + Sync {
    /// Blocking input loop. Call `emit` for every complete sentence read
    /// off the wire; `emit` tags it with the interface's id itself.
    fn run_input(&self, iface: &Interface, emit: &mut dyn FnMut(Senblk)) -> std::io::Result<()>;

    /// Blocking output loop. Call `next` to pull the next queued sentence;
    /// `next` returns `None` once the interface's queue has been
    /// deactivated, at which point the loop should return.
    fn run_output(
        &self,
        iface: &Interface,
        next: &mut dyn FnMut() -> Option<Senblk>,
    ) -> std::io::Result<()>;

    /// Releases transport-private resources (closes file descriptors,
    /// restores terminal settings, …). Called exactly once, after the
    /// read/write loop has returned, before the interface is unlinked.
    fn cleanup(&self);

    /// Human-readable identity for logging, e.g. `"serial:/dev/ttyUSB0"`.
    fn description(&self) -> String;
}
