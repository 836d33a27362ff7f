use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use kplex_core::{InterfaceId, Senblk};
use kplex_queue::BoundedQueue;

use crate::Transport;

/// The runtime direction of an interface. Configuration-time `both` is
/// never seen here: every transport initializer expands a `both`
/// descriptor into an `In`/`Out` pair before any [`Interface`] — and so
/// before any worker thread — exists (see DESIGN.md; this is the
/// type-level `Both` ban §9 explicitly licenses).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

/// Which queue an interface reads from or writes to.
///
/// `In` interfaces share the engine's single central queue; `Out`
/// interfaces each own a private queue that only the engine ever pushes
/// to. Modeling this as an enum rather than a bare `BoundedQueue` field
/// makes "output interfaces own an exclusive queue; input interfaces hold
/// a reference to the engine's central queue" (§3) a type-level fact
/// instead of a convention.
#[derive(Clone)]
pub enum InterfaceQueue {
    Central(BoundedQueue<Senblk>),
    Dedicated(BoundedQueue<Senblk>),
}

impl InterfaceQueue {
    pub fn queue(&self) -> &BoundedQueue<Senblk> {
        match self {
            InterfaceQueue::Central(q) | InterfaceQueue::Dedicated(q) => q,
        }
    }
}

/// One endpoint: a transport, its direction, its queue, and its place in
/// the pairing and cancellation protocol.
///
/// The original `iface_t` is reached through raw pointers from four
/// places at once (the topology's lists, the engine's traversal, the
/// paired interface, and the thread's own stack). Here every one of those
/// reaches through an `Arc<Interface>` clone instead; `id` gives list
/// membership and pair back-links a stable value to compare, so removing
/// "this interface" from a `Vec` means comparing ids, not pointer
/// identity.
pub struct Interface {
    pub id: InterfaceId,
    pub direction: Direction,
    pub transport: Arc<dyn Transport>,
    pub queue: InterfaceQueue,
    pub description: String,
    cancelled: AtomicBool,
    pair: Mutex<Option<Arc<Interface>>>,
    #[cfg(unix)]
    os_tid: Mutex<Option<libc::pthread_t>>,
}

impl Interface {
    pub fn new(
        direction: Direction,
        transport: Arc<dyn Transport>,
        queue: InterfaceQueue,
        description: String,
    ) -> Arc<Interface> {
        Arc::new(Interface {
            id: InterfaceId::next(),
            direction,
            transport,
            queue,
            description,
            cancelled: AtomicBool::new(false),
            pair: Mutex::new(None),
            #[cfg(unix)]
            os_tid: Mutex::new(None),
        })
    }

    /// Links two interfaces as the `(IN, OUT)` halves of one `both`
    /// configuration entry. Symmetric: each holds a reference to the
    /// other.
    pub fn link_pair(a: &Arc<Interface>, b: &Arc<Interface>) {
        *a.pair.lock().unwrap() = Some(b.clone());
        *b.pair.lock().unwrap() = Some(a.clone());
    }

    pub fn pair(&self) -> Option<Arc<Interface>> {
        self.pair.lock().unwrap().clone()
    }

    pub(crate) fn take_pair(&self) -> Option<Arc<Interface>> {
        self.pair.lock().unwrap().take()
    }

    pub(crate) fn clear_pair(&self) {
        *self.pair.lock().unwrap() = None;
    }

    /// Whether this interface's pair is the source of a sentence — the
    /// loopback exclusion test from §4.2. Equality of ids stands in for
    /// the original's raw pointer comparison `sptr->src != optr->pair`.
    pub fn pair_id(&self) -> Option<InterfaceId> {
        self.pair().map(|p| p.id)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Marks the interface cancelled and, on unix, sends SIGUSR1 to the
    /// worker thread so a blocking `read`/`write` syscall returns `EINTR`
    /// and the worker can observe `is_cancelled()` on its next check. This
    /// is *cancel-worker* from §4.7, re-expressed without a thread-local
    /// interface pointer: the thread id is recorded directly on the
    /// record it's running instead.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.signal_worker();
    }

    pub(crate) fn record_tid(&self) {
        #[cfg(unix)]
        {
            *self.os_tid.lock().unwrap() = Some(unsafe { libc::pthread_self() });
        }
    }

    #[cfg(unix)]
    fn signal_worker(&self) {
        if let Some(tid) = *self.os_tid.lock().unwrap() {
            unsafe {
                libc::pthread_kill(tid, libc::SIGUSR1);
            }
        }
    }

    #[cfg(not(unix))]
    fn signal_worker(&self) {}
}
