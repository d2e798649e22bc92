use anyhow::Result;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::errors::EngineError;
use crate::events::{EngineCommand, EngineEvent};
use crate::geometry::{Point, Region};
use crate::zone::ZoneCallback;

/// Cloneable front to a running engine: commands go over an mpsc channel,
/// each with a oneshot reply.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_tx: broadcast::Sender<EngineEvent>,
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle").finish()
    }
}

impl EngineHandle {
    pub(crate) fn new(
        cmd_tx: mpsc::Sender<EngineCommand>,
        event_tx: broadcast::Sender<EngineEvent>,
    ) -> Self {
        Self { cmd_tx, event_tx }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_tx.subscribe()
    }

    /// Replace the active zone set for a new trial.
    pub async fn setup(
        &self,
        zones: Vec<(Region, ZoneCallback)>,
    ) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(EngineCommand::Setup { zones, reply: tx })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        rx.await.map_err(|_| EngineError::ChannelClosed)?
    }

    /// Flush the current trial's records to the session log.
    pub async fn save(&self) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(EngineCommand::Save { reply: tx })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        rx.await.map_err(|_| EngineError::ChannelClosed)?
    }

    /// Latest complete normalized pointer snapshot.
    pub async fn positions(&self) -> Result<Vec<Point>, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(EngineCommand::Positions { reply: tx })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        rx.await.map_err(|_| EngineError::ChannelClosed)
    }

    /// Forward a region-of-interest rectangle to event subscribers.
    pub async fn set_roi(&self, min: Point, max: Point) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(EngineCommand::SetRoi {
                min,
                max,
                reply: tx,
            })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        rx.await.map_err(|_| EngineError::ChannelClosed)
    }

    /// Stop both tick loops and tear the session down.
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(EngineCommand::Shutdown { reply: tx })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        rx.await.map_err(|_| EngineError::ChannelClosed)
    }
}
