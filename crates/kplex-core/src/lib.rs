//! Shared types for the kplex multiplexer: the error taxonomy, the sentence
//! block (senblk) record, and the handful of protocol-wide constants.

mod error;
mod ids;
mod senblk;

pub use error::{KplexError, Result};
pub use ids::InterfaceId;
pub use senblk::Senblk;

/// Maximum NMEA-0183 sentence length, terminator included. Standard NMEA
/// caps a sentence at 82 bytes; this is also the cap used by the Seatalk
/// translation layer for its synthesized sentences.
pub const SENMAX: usize = 82;

/// Default capacity (in senblks) of the engine's central input queue.
pub const DEFQUEUESZ: usize = 32;

/// Default per-output queue capacity for serial-class (and Seatalk) output
/// interfaces, used when no `qsize` option is given.
pub const DEFSERIALQSIZE: usize = 32;

/// Minimum accepted `-q`/`qsize` value.
pub const MIN_QUEUE_SIZE: usize = 2;
