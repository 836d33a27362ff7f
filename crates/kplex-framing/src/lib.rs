//! Reusable sentence framers: the `CR LF` line framer used by every
//! serial-class input, and the Seatalk command framer wrapping the
//! Seatalk-to-NMEA translation table.

mod line;
mod nmea;
mod seatalk;

pub use line::LineFramer;
pub use nmea::{checksum, frame_sentence};
pub use seatalk::{translate, SeatalkFramer};
