pub mod config;
pub mod device;
pub mod engine;
pub mod errors;
pub mod events;
pub mod geometry;
pub mod logging;
pub mod sync;
pub mod trial;
pub mod zone;

pub use config::EngineConfig;
pub use engine::*;
pub use errors::EngineError;
pub use events::EngineEvent;
