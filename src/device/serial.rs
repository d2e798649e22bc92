use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::errors::EngineError;

/// Byte transport carrying the hardware event stream.
pub trait SerialTransport: Send {
    /// Bytes currently readable without blocking.
    fn bytes_available(&self) -> usize;

    /// Read up to `limit` bytes; may return fewer.
    fn read(&mut self, limit: usize) -> Result<Vec<u8>, EngineError>;
}

/// In-memory transport: bytes pushed on one side come out of `read` on the
/// other. Clones share the same queue.
#[derive(Clone, Default)]
pub struct LoopbackTransport {
    queue: Arc<Mutex<VecDeque<u8>>>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, bytes: &[u8]) {
        self.queue.lock().unwrap().extend(bytes.iter().copied());
    }
}

impl SerialTransport for LoopbackTransport {
    fn bytes_available(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    fn read(&mut self, limit: usize) -> Result<Vec<u8>, EngineError> {
        let mut queue = self.queue.lock().unwrap();
        let take = limit.min(queue.len());
        Ok(queue.drain(..take).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_is_bounded_and_drains_in_order() {
        let transport = LoopbackTransport::new();
        transport.push(&[1, 2, 3, 4, 5]);

        let mut reader = transport.clone();
        assert_eq!(reader.bytes_available(), 5);
        assert_eq!(reader.read(2).unwrap(), vec![1, 2]);
        assert_eq!(reader.read(10).unwrap(), vec![3, 4, 5]);
        assert_eq!(reader.read(1).unwrap(), Vec::<u8>::new());
    }
}
