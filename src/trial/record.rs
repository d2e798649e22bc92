use serde::Serialize;

use crate::zone::ZoneId;

/// One tracked sample, buffered in memory until the trial is saved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackRecord {
    /// Seconds since the session started.
    pub time: f64,
    /// Normalized x of the pointer.
    pub x: f64,
    /// Normalized y of the pointer.
    pub y: f64,
    /// Pointer index at record time.
    pub pointer: usize,
    /// Active zone at record time; [`ZoneId::NONE`] when outside all zones.
    pub zone: ZoneId,
    /// Trial number the record belongs to.
    pub trial: u32,
}

impl TrackRecord {
    /// Session-log row: 4-decimal time and coordinates, integer ids.
    pub(crate) fn csv_row(&self) -> String {
        format!(
            "{:.4}, {:.4}, {:.4}, {}, {}, {}",
            self.time, self.x, self.y, self.pointer, self.zone, self.trial
        )
    }
}
