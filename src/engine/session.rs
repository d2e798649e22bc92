use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::device::{BlobTracker, Camera};
use crate::events::{EngineCommand, EngineEvent};
use crate::sync::SyncLogger;
use crate::trial::TrialController;

/// The frame-tick loop: acquire a frame, track it, feed the controller.
/// Also the command loop for the engine handle. One tick runs to
/// completion before the next begins.
pub(crate) struct SessionWorker {
    pub controller: TrialController,
    pub camera: Arc<dyn Camera>,
    pub tracker: Box<dyn BlobTracker>,
    pub cmd_rx: mpsc::Receiver<EngineCommand>,
    pub event_tx: broadcast::Sender<EngineEvent>,
    pub frame_interval: Duration,
}

impl SessionWorker {
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.frame_interval);
        let _ = self.event_tx.send(EngineEvent::EngineStarted);

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => {
                    let Some(cmd) = cmd else { break };
                    if self.handle_command(cmd) {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.frame_tick();
                }
            }
        }

        // Tick delivery has stopped by the time we get here; release the
        // zones before announcing the stop so no callback runs against a
        // torn-down session.
        self.controller.teardown();
        let _ = self.event_tx.send(EngineEvent::EngineStopped);
    }

    fn frame_tick(&mut self) {
        let Some(frame) = self.camera.grab() else {
            return;
        };
        let positions = self.tracker.track(&frame);
        self.controller.on_frame(&positions);
    }

    /// Returns true when the worker should stop.
    fn handle_command(&mut self, cmd: EngineCommand) -> bool {
        log::debug!("session command: {cmd:?}");
        match cmd {
            EngineCommand::Setup { zones, reply } => {
                let _ = reply.send(self.controller.setup(zones));
            }
            EngineCommand::Save { reply } => {
                let _ = reply.send(self.controller.save());
            }
            EngineCommand::Positions { reply } => {
                let _ = reply.send(self.controller.positions());
            }
            EngineCommand::SetRoi { min, max, reply } => {
                let _ = self.event_tx.send(EngineEvent::RoiChanged { min, max });
                let _ = reply.send(());
            }
            EngineCommand::Shutdown { reply } => {
                let _ = reply.send(());
                return true;
            }
        }
        false
    }
}

/// The serial-tick loop, independent of the frame loop. Shares nothing
/// with it but the position snapshot inside the [`SyncLogger`].
pub(crate) struct SyncWorker {
    pub logger: SyncLogger,
    pub serial_interval: Duration,
    pub cancel: CancellationToken,
}

impl SyncWorker {
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.serial_interval);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.logger.tick() {
                        // Log appends are load-bearing; a failed write ends
                        // the loop rather than silently losing edges.
                        log::error!("sync log append failed, stopping serial loop: {e}");
                        break;
                    }
                }
            }
        }
    }
}
