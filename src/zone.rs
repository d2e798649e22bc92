//! Zone system: [`ZoneRegistry`], [`ZoneHandle`], [`ZoneId`], and the
//! membership-event callback types.

mod handle;
mod registry;
mod zone;

pub use handle::ZoneHandle;
pub use registry::ZoneRegistry;
pub use zone::{noop_callback, ZoneCallback, ZoneEvent, ZoneId};

pub(crate) use registry::RegistryInner;
pub(crate) use zone::Zone;
