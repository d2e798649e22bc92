//! External collaborator contracts: camera acquisition, blob tracking, and
//! the serial byte transport, plus null/in-memory implementations for
//! headless runs and tests.

mod camera;
mod serial;
mod tracker;

pub use camera::{Camera, CameraPool, Frame, NullCamera};
pub use serial::{LoopbackTransport, SerialTransport};
pub use tracker::{BlobTracker, ScriptedTracker};
