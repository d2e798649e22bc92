//! Hardware trigger correlation: the bit-packed serial event decoder and
//! the [`SyncLogger`] that appends rising edges next to the tracked
//! position.

mod decoder;
mod logger;

pub use decoder::{decode, PinEvent, SyncCounters, PIN_COUNT};
pub use logger::SyncLogger;

/// Header row of the sync log.
pub const SYNC_LOG_HEADER: &str = "time, x, y, pin, count";
