use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::errors::EngineError;

/// One captured frame. Pixel content is opaque to the core; the blob
/// tracker turns it into pointer coordinates.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Row-major luminance samples; empty for synthetic sources.
    pub data: Vec<u8>,
}

/// A frame source with a fixed capture resolution.
pub trait Camera: Send + Sync {
    fn name(&self) -> &str;

    /// Current capture resolution as (width, height).
    fn resolution(&self) -> (u32, u32);

    /// Grab the most recent frame, if one is ready.
    fn grab(&self) -> Option<Frame>;
}

/// Synthetic camera for tests and headless runs: every grab yields an
/// empty frame at the configured resolution.
pub struct NullCamera {
    name: String,
    width: u32,
    height: u32,
}

impl NullCamera {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }
}

impl Camera for NullCamera {
    fn name(&self) -> &str {
        &self.name
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn grab(&self) -> Option<Frame> {
        Some(Frame {
            width: self.width,
            height: self.height,
            data: Vec::new(),
        })
    }
}

type CameraFactory = Box<dyn Fn(&str) -> Result<Arc<dyn Camera>, EngineError> + Send + Sync>;

struct PoolEntry {
    camera: Arc<dyn Camera>,
    refs: usize,
}

/// Reference-counted camera factory keyed by device name.
///
/// Prevents double-opening the same piece of hardware: a second acquire of
/// a name returns the already-open device. The pool is an owned value
/// constructed at process start, not a hidden process-wide cache.
pub struct CameraPool {
    open: Mutex<HashMap<String, PoolEntry>>,
    factory: CameraFactory,
}

impl CameraPool {
    pub fn new(factory: CameraFactory) -> Self {
        Self {
            open: Mutex::new(HashMap::new()),
            factory,
        }
    }

    /// Pool whose factory resolves every name to a [`NullCamera`] at the
    /// given resolution.
    pub fn with_null_cameras(width: u32, height: u32) -> Self {
        Self::new(Box::new(move |name| {
            Ok(Arc::new(NullCamera::new(name, width, height)))
        }))
    }

    /// Open (or re-share) the device with this name.
    pub fn acquire(&self, name: &str) -> Result<Arc<dyn Camera>, EngineError> {
        let mut open = self.open.lock().unwrap();
        if let Some(entry) = open.get_mut(name) {
            entry.refs += 1;
            return Ok(entry.camera.clone());
        }

        let camera = (self.factory)(name)?;
        open.insert(
            name.to_string(),
            PoolEntry {
                camera: camera.clone(),
                refs: 1,
            },
        );
        Ok(camera)
    }

    /// Drop one reference; the device closes when the last one goes.
    pub fn release(&self, name: &str) {
        let mut open = self.open.lock().unwrap();
        let last = match open.get_mut(name) {
            Some(entry) => {
                entry.refs -= 1;
                entry.refs == 0
            }
            None => false,
        };
        if last {
            open.remove(name);
        }
    }

    /// Live reference count for a device name.
    pub fn refs(&self, name: &str) -> usize {
        self.open
            .lock()
            .unwrap()
            .get(name)
            .map(|e| e.refs)
            .unwrap_or(0)
    }
}
