//! Trial state machine: [`TrialController`], [`TrackRecord`], and the
//! per-(zone, pointer) hysteresis memory.

mod controller;
mod record;
mod state;

pub use controller::TrialController;
pub use record::TrackRecord;
pub use state::{Trial, ZoneState};

/// Header row of the session log.
pub const SESSION_LOG_HEADER: &str = "time, x, y, pointer, zone, trial";
