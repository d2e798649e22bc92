//! Engine core: [`ArenaEngine`], [`EngineHandle`], and the session tick
//! workers.

mod engine;
mod handle;
mod session;

pub use engine::ArenaEngine;
pub use handle::EngineHandle;

pub(crate) use session::{SessionWorker, SyncWorker};

pub(crate) const DEFAULT_CHANNEL_CAPACITY: usize = 64;
