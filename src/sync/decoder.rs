//! Bit-packed serial event protocol.
//!
//! One byte per pin event: bits 0-5 carry the pin number, bit 6 the
//! observed level (clear means high), and bit 7 must be clear. A byte with
//! bit 7 set belongs to an extended protocol this version does not speak;
//! it is dropped, and the stream re-synchronizes on the next byte.

use crate::errors::EngineError;

/// Number of addressable pins (6 bits).
pub const PIN_COUNT: usize = 64;

/// A decoded pin transition.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PinEvent {
    pub pin: u8,
    /// Observed level after the toggle.
    pub high: bool,
}

/// Decode one protocol byte.
pub fn decode(byte: u8) -> Result<PinEvent, EngineError> {
    if byte & 0x80 != 0 {
        return Err(EngineError::ProtocolUnsupported(byte));
    }
    Ok(PinEvent {
        pin: byte & 0x3f,
        high: byte & 0x40 == 0,
    })
}

/// Per-pin monotone toggle counters.
///
/// The first event observed for a pin establishes its baseline: the counter
/// starts at 1 if the level is high, else 0, so post-baseline parity always
/// mirrors the current level (even = low, odd = high). Every later event
/// increments by one regardless of level.
#[derive(Debug)]
pub struct SyncCounters {
    counts: [u32; PIN_COUNT],
    primed: [bool; PIN_COUNT],
}

impl SyncCounters {
    pub fn new() -> Self {
        Self {
            counts: [0; PIN_COUNT],
            primed: [false; PIN_COUNT],
        }
    }

    /// Apply one event and return the pin's updated count.
    pub fn apply(&mut self, event: PinEvent) -> u32 {
        let pin = event.pin as usize;
        if self.primed[pin] {
            self.counts[pin] += 1;
        } else {
            self.primed[pin] = true;
            self.counts[pin] = if event.high { 1 } else { 0 };
        }
        self.counts[pin]
    }

    /// Current count for a pin, `None` before its baseline is established.
    pub fn count(&self, pin: u8) -> Option<u32> {
        let pin = pin as usize;
        self.primed[pin].then(|| self.counts[pin])
    }
}

impl Default for SyncCounters {
    fn default() -> Self {
        Self::new()
    }
}
