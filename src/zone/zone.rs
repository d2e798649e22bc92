use std::fmt::{self, Display};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::geometry::{Region, RegionMask};
use crate::zone::ZoneHandle;

/// A unique identifier for a zone.
///
/// Ids are assigned monotonically by the registry, starting at 1, and are
/// never reused for the life of that registry. Id 0 is reserved to mean
/// "no zone" in track records.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZoneId(pub(crate) u32);

impl ZoneId {
    pub const NONE: ZoneId = ZoneId(0);

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payload delivered to a zone's callback on a membership edge.
#[derive(Clone)]
pub struct ZoneEvent {
    /// Normalized x of the tested segment's end point.
    pub x: f64,
    /// Normalized y of the tested segment's end point.
    pub y: f64,
    /// True on enter, false on exit.
    pub entered: bool,
    /// Handle for the zone that fired; callbacks may release it.
    pub handle: ZoneHandle,
}

impl fmt::Debug for ZoneEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZoneEvent")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("entered", &self.entered)
            .field("zone", &self.handle.id())
            .finish()
    }
}

/// Callback invoked on zone enter/exit.
pub type ZoneCallback = Arc<dyn Fn(ZoneEvent) + Send + Sync>;

/// The default callback: does nothing.
pub fn noop_callback() -> ZoneCallback {
    Arc::new(|_| {})
}

/// One tracked spatial region with its rasterized mask and callback.
/// Owned exclusively by the registry.
pub(crate) struct Zone {
    pub id: ZoneId,
    pub region: Region,
    pub mask: RegionMask,
    pub callback: ZoneCallback,
}
