use crate::{InterfaceId, SENMAX};

/// A sentence block: one NMEA-0183 sentence plus its source identity.
///
/// The original `senblk_t` is `{data[SENMAX], len, src, next}`, with `next`
/// the intrusive queue link. `Senblk` here carries only the payload and
/// `src`; the queue link is gone because [`kplex_queue::BoundedQueue`]
/// stores its pending items in a `VecDeque` rather than an intrusive list
/// (see DESIGN.md for the full justification). `data` stays a fixed-size
/// array so a `Senblk` is plain `Copy` data, matching the original's
/// pre-allocated, fixed-capacity cells.
#[derive(Debug, Clone, Copy)]
pub struct Senblk {
    data: [u8; SENMAX],
    len: usize,
    src: InterfaceId,
}

impl Senblk {
    /// Builds a senblk from a byte slice, truncating to `SENMAX` bytes.
    /// Callers that must enforce the "drop overlength sentences" rule (the
    /// line framer, the Seatalk framer) check the length themselves before
    /// calling this; `new` truncates defensively rather than panicking.
    pub fn new(bytes: &[u8], src: InterfaceId) -> Self {
        let len = bytes.len().min(SENMAX);
        let mut data = [0u8; SENMAX];
        data[..len].copy_from_slice(&bytes[..len]);
        Senblk { data, len, src }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn src(&self) -> InterfaceId {
        self.src
    }
}
