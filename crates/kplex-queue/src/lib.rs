//! A bounded, single-consumer queue with a drop-oldest back-pressure policy.
//!
//! This is the engine's central input queue and every output's private
//! queue. The shape — `Mutex<State>` plus one `Condvar`, wrapped in an
//! `Arc` so the queue can be cloned and shared between a producer thread
//! and a consumer thread — follows the same pattern as a synchronized
//! priority queue built on `Mutex`/`Condvar`: producers never block on
//! `push`, consumers block on `pop` until data arrives or the queue is
//! deactivated.
//!
//! Unlike that queue, this one is not fair-scheduled across priorities: it
//! is a plain FIFO ring with a fixed capacity, and a full queue sheds its
//! *oldest* pending item rather than rejecting the newest one. The original
//! C implementation pre-allocates `capacity` senblk cells and threads them
//! through a free list and an active list by hand; `VecDeque` already gives
//! us that cell-reuse behavior for free; a manual free list only paid for
//! itself in C's fixed-allocation world (see DESIGN.md).

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

use kplex_core::{KplexError, Result, MIN_QUEUE_SIZE};

struct State<T> {
    ring: VecDeque<T>,
    capacity: usize,
    active: bool,
}

struct Inner<T> {
    state: Mutex<State<T>>,
    not_empty: Condvar,
}

/// A bounded FIFO queue shared between one producer side and one consumer
/// side via cloning.
pub struct BoundedQueue<T> {
    inner: std::sync::Arc<Inner<T>>,
}

impl<T> Clone for BoundedQueue<T> {
    fn clone(&self) -> Self {
        BoundedQueue {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone> BoundedQueue<T> {
    /// Creates a queue with room for `capacity` pending items, all of them
    /// initially free. Fails only if `capacity` is too small to be useful;
    /// the CLI enforces the same `-q`/`qsize` minimum (see §6).
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity < MIN_QUEUE_SIZE {
            return Err(KplexError::InvalidQueueCapacity(capacity));
        }
        Ok(BoundedQueue {
            inner: std::sync::Arc::new(Inner {
                state: Mutex::new(State {
                    ring: VecDeque::with_capacity(capacity),
                    capacity,
                    active: true,
                }),
                not_empty: Condvar::new(),
            }),
        })
    }

    /// Appends `item` to the tail. Never blocks: when the queue is already
    /// at capacity, the head (oldest pending item) is silently dropped to
    /// make room. A no-op once the queue has been deactivated — pushing
    /// into a dying queue would just be further work for nobody to collect.
    pub fn push(&self, item: T) {
        let mut st = match self.inner.state.lock() {
            Ok(st) => st,
            Err(_) => return,
        };
        if !st.active {
            return;
        }
        if st.ring.len() >= st.capacity {
            st.ring.pop_front();
        }
        st.ring.push_back(item);
        drop(st);
        self.inner.not_empty.notify_all();
    }

    /// The "push(nil)" operation from the original: marks the queue
    /// inactive. Monotonic — deactivating twice is harmless. Wakes every
    /// blocked `pop()` so it can observe the new state.
    pub fn deactivate(&self) {
        let mut st = match self.inner.state.lock() {
            Ok(st) => st,
            Err(_) => return,
        };
        st.active = false;
        drop(st);
        self.inner.not_empty.notify_all();
    }

    /// Blocks until an item is available or the queue is inactive and
    /// empty. Returns `None` only in the latter case, which the engine and
    /// every output worker treat as "time to shut down". Tolerates
    /// spurious wakeups by rechecking the condition in a loop.
    pub fn pop(&self) -> Option<T> {
        let mut st = self.inner.state.lock().ok()?;
        loop {
            if let Some(item) = st.ring.pop_front() {
                return Some(item);
            }
            if !st.active {
                return None;
            }
            st = self.inner.not_empty.wait(st).ok()?;
        }
    }

    /// Number of items currently pending. Exposed for tests that assert on
    /// drop-oldest behavior; not part of the steady-state data path.
    pub fn len(&self) -> usize {
        self.inner.state.lock().map(|st| st.ring.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_active(&self) -> bool {
        self.inner.state.lock().map(|st| st.active).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn fifo_order() {
        let q: BoundedQueue<i32> = BoundedQueue::new(4).unwrap();
        q.push(1);
        q.push(2);
        q.push(3);
        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), Some(3));
    }

    #[test]
    fn drop_oldest_under_pressure() {
        let q: BoundedQueue<i32> = BoundedQueue::new(2).unwrap();
        q.push(1);
        q.push(2);
        // Queue is full; pushing a third item must displace the head (1),
        // not the tail, and the queue must still hold exactly `capacity`
        // items.
        q.push(3);
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), Some(3));
    }

    #[test]
    fn deactivate_then_drain_then_nil_forever() {
        let q: BoundedQueue<i32> = BoundedQueue::new(4).unwrap();
        q.push(1);
        q.push(2);
        q.deactivate();
        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), None);
        assert_eq!(q.pop(), None);
        assert!(!q.is_active());
    }

    #[test]
    fn pop_blocks_until_push() {
        let q: BoundedQueue<i32> = BoundedQueue::new(4).unwrap();
        let q2 = q.clone();
        let h = thread::spawn(move || q2.pop());
        thread::sleep(Duration::from_millis(30));
        q.push(42);
        assert_eq!(h.join().unwrap(), Some(42));
    }

    #[test]
    fn pop_blocks_until_deactivate() {
        let q: BoundedQueue<i32> = BoundedQueue::new(4).unwrap();
        let q2 = q.clone();
        let h = thread::spawn(move || q2.pop());
        thread::sleep(Duration::from_millis(30));
        q.deactivate();
        assert_eq!(h.join().unwrap(), None);
    }

    #[test]
    fn rejects_tiny_capacity() {
        assert!(BoundedQueue::<i32>::new(1).is_err());
        assert!(BoundedQueue::<i32>::new(0).is_err());
    }

    #[test]
    fn push_after_deactivate_is_noop() {
        let q: BoundedQueue<i32> = BoundedQueue::new(4).unwrap();
        q.deactivate();
        q.push(1);
        assert_eq!(q.pop(), None);
    }
}
