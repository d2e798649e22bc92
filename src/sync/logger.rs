use std::collections::VecDeque;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use crate::config::SyncConfig;
use crate::device::SerialTransport;
use crate::errors::EngineError;
use crate::geometry::Point;
use crate::logging::LogFile;
use crate::sync::{decode, SyncCounters};

/// Decodes the serial event stream and appends position-correlated rising
/// edges to the sync log.
///
/// Processing is bounded per tick: at most `read_budget` bytes are pulled
/// from the transport and at most `decode_budget` queued bytes are decoded;
/// whatever remains stays queued for the next tick. Backpressure defers,
/// it never drops.
pub struct SyncLogger {
    transport: Box<dyn SerialTransport>,
    queue: VecDeque<u8>,
    counters: SyncCounters,
    dropped: u64,
    log: LogFile,
    started: Instant,
    /// Position snapshot shared with the frame loop; read as a whole.
    snapshot: Arc<RwLock<Vec<Point>>>,
    read_budget: usize,
    decode_budget: usize,
}

impl SyncLogger {
    pub fn new(
        transport: Box<dyn SerialTransport>,
        log: LogFile,
        started: Instant,
        snapshot: Arc<RwLock<Vec<Point>>>,
        config: SyncConfig,
    ) -> Self {
        Self {
            transport,
            queue: VecDeque::new(),
            counters: SyncCounters::new(),
            dropped: 0,
            log,
            started,
            snapshot,
            read_budget: config.read_budget.max(1),
            decode_budget: config.decode_budget.max(1),
        }
    }

    /// One bounded tick of the serial loop.
    pub fn tick(&mut self) -> Result<(), EngineError> {
        let available = self.transport.bytes_available();
        if available > 0 {
            let bytes = self.transport.read(available.min(self.read_budget))?;
            self.queue.extend(bytes);
        }

        for _ in 0..self.decode_budget {
            let Some(byte) = self.queue.pop_front() else {
                break;
            };
            self.process(byte)?;
        }
        Ok(())
    }

    /// Decode one byte: count every toggle, log rising edges only. An
    /// unsupported byte is dropped and counted, never fatal.
    fn process(&mut self, byte: u8) -> Result<(), EngineError> {
        let event = match decode(byte) {
            Ok(event) => event,
            Err(e) => {
                self.dropped += 1;
                log::warn!("dropping serial byte ({} so far): {e}", self.dropped);
                return Ok(());
            }
        };

        let count = self.counters.apply(event);
        if event.high {
            let position = self
                .snapshot
                .read()
                .unwrap()
                .first()
                .copied()
                .unwrap_or_default();
            let elapsed = self.started.elapsed().as_secs_f64();
            let row = format!(
                "{:.4}, {:.4}, {:.4}, {}, {}\n",
                elapsed, position.x, position.y, event.pin, count
            );
            self.log.append(&row)?;
        }
        Ok(())
    }

    pub fn counters(&self) -> &SyncCounters {
        &self.counters
    }

    /// Bytes still queued for later ticks.
    pub fn backlog(&self) -> usize {
        self.queue.len()
    }

    /// Unsupported bytes discarded so far.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
