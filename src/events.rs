//! Engine events and commands.
//!
//! [`EngineEvent`] is broadcast to every subscriber of the engine's event
//! bus; [`EngineCommand`] travels over the handle's mpsc channel with a
//! oneshot reply per call.

use std::fmt;

use tokio::sync::oneshot;

use crate::errors::EngineError;
use crate::geometry::{Point, Region};
use crate::zone::{ZoneCallback, ZoneId};

/// Events emitted by the engine.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    EngineStarted,
    EngineStopped,
    /// Full normalized pointer array after a processed frame change.
    PositionChanged { positions: Vec<Point> },
    /// A pointer crossed a zone boundary. Mirrors the per-zone callback on
    /// the bus for subscribers that did not register one.
    ZoneCrossed {
        zone: ZoneId,
        x: f64,
        y: f64,
        entered: bool,
    },
    /// Normalized region-of-interest rectangle passthrough.
    RoiChanged { min: Point, max: Point },
    /// A trial's records were flushed to the session log.
    TrialSaved { trial: u32, records: usize },
}

/// Commands accepted by the session worker.
pub enum EngineCommand {
    /// Replace the active zone set for a new trial.
    Setup {
        zones: Vec<(Region, ZoneCallback)>,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    /// Flush the current trial's records to the session log.
    Save {
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    /// Read the latest normalized pointer snapshot.
    Positions {
        reply: oneshot::Sender<Vec<Point>>,
    },
    /// Forward a region-of-interest change to subscribers.
    SetRoi {
        min: Point,
        max: Point,
        reply: oneshot::Sender<()>,
    },
    /// Stop both tick loops and tear the session down.
    Shutdown { reply: oneshot::Sender<()> },
}

impl fmt::Debug for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineCommand::Setup { zones, .. } => f
                .debug_struct("Setup")
                .field("zones", &zones.len())
                .finish(),
            EngineCommand::Save { .. } => f.debug_struct("Save").finish(),
            EngineCommand::Positions { .. } => f.debug_struct("Positions").finish(),
            EngineCommand::SetRoi { min, max, .. } => f
                .debug_struct("SetRoi")
                .field("min", min)
                .field("max", max)
                .finish(),
            EngineCommand::Shutdown { .. } => f.debug_struct("Shutdown").finish(),
        }
    }
}
