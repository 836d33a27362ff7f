use std::sync::atomic::{AtomicU64, Ordering};

/// Stable handle identifying one runtime interface.
///
/// The original implementation compares raw `iface_t *` pointers for the
/// loopback guard (`sptr->src != optr->pair`) and for pair back-links. Here
/// the topology owns every interface record behind an `Arc`, so a small
/// monotonically-increasing id plays the same role without exposing
/// addresses: two ids compare equal iff they name the same interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterfaceId(u64);

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

impl InterfaceId {
    /// Allocates a fresh, never-reused id.
    pub fn next() -> Self {
        InterfaceId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "if#{}", self.0)
    }
}
