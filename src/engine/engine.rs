use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::device::{BlobTracker, Camera, CameraPool, SerialTransport};
use crate::engine::{SessionWorker, SyncWorker, DEFAULT_CHANNEL_CAPACITY};
use crate::errors::EngineError;
use crate::events::{EngineCommand, EngineEvent};
use crate::geometry::Point;
use crate::logging::{timestamped_name, LogFile};
use crate::sync::{SyncLogger, SYNC_LOG_HEADER};
use crate::trial::{TrialController, SESSION_LOG_HEADER};
use crate::EngineHandle;

/// Owns a configured session before it runs: the acquired camera, the
/// tracker and serial transport, and the command/event channels.
pub struct ArenaEngine {
    config: EngineConfig,
    pool: Arc<CameraPool>,
    camera: Arc<dyn Camera>,
    tracker: Box<dyn BlobTracker>,
    transport: Box<dyn SerialTransport>,
    cmd_tx: mpsc::Sender<EngineCommand>,
    cmd_rx: mpsc::Receiver<EngineCommand>,
    event_tx: broadcast::Sender<EngineEvent>,
    running: bool,
}

impl ArenaEngine {
    /// Acquire the configured camera and stage a session.
    ///
    /// Fails with [`EngineError::DeviceUnavailable`] when the pool cannot
    /// open the device: without a position source the engine cannot run.
    pub fn new(
        config: EngineConfig,
        pool: Arc<CameraPool>,
        tracker: Box<dyn BlobTracker>,
        transport: Box<dyn SerialTransport>,
    ) -> Result<Self, EngineError> {
        let camera = pool.acquire(&config.camera)?;
        log::info!(
            "acquired camera '{}' at {:?}",
            config.camera,
            camera.resolution()
        );

        let (cmd_tx, cmd_rx) = mpsc::channel::<EngineCommand>(DEFAULT_CHANNEL_CAPACITY);
        let (event_tx, _first_rx) = broadcast::channel::<EngineEvent>(DEFAULT_CHANNEL_CAPACITY);

        Ok(Self {
            config,
            pool,
            camera,
            tracker,
            transport,
            cmd_tx,
            cmd_rx,
            event_tx,
            running: false,
        })
    }

    /// Start the frame and serial tick loops, returning a handle and the
    /// join handle of the session task.
    ///
    /// The two loops run independently and share only the position
    /// snapshot. Shutdown stops tick delivery first, then releases zones,
    /// then the camera.
    pub fn start(self) -> Result<(EngineHandle, JoinHandle<()>), EngineError> {
        if self.running {
            return Err(EngineError::AlreadyRunning);
        }

        let started = Instant::now();
        let started_wall = time::OffsetDateTime::now_utc();
        let snapshot: Arc<RwLock<Vec<Point>>> = Arc::new(RwLock::new(Vec::new()));

        let session_path = self.log_path("session", self.config.session_log.clone(), started_wall);
        let sync_path = self.log_path("sync", self.config.sync_log.clone(), started_wall);
        log::info!(
            "session log at {}, sync log at {}",
            session_path.display(),
            sync_path.display()
        );

        let controller = TrialController::new(
            self.camera.resolution(),
            LogFile::new(session_path, SESSION_LOG_HEADER),
            started,
            self.event_tx.clone(),
            snapshot.clone(),
        );
        let logger = SyncLogger::new(
            self.transport,
            LogFile::new(sync_path, SYNC_LOG_HEADER),
            started,
            snapshot,
            self.config.sync,
        );

        let session = SessionWorker {
            controller,
            camera: self.camera,
            tracker: self.tracker,
            cmd_rx: self.cmd_rx,
            event_tx: self.event_tx.clone(),
            frame_interval: Duration::from_millis(self.config.frame_interval_ms.max(1)),
        };
        let cancel = CancellationToken::new();
        let sync = SyncWorker {
            logger,
            serial_interval: Duration::from_millis(self.config.serial_interval_ms.max(1)),
            cancel: cancel.clone(),
        };

        let handle = EngineHandle::new(self.cmd_tx.clone(), self.event_tx.clone());
        let pool = self.pool;
        let camera_name = self.config.camera.clone();

        let join = tokio::spawn(async move {
            let sync_task = tokio::spawn(sync.run());
            session.run().await;
            cancel.cancel();
            let _ = sync_task.await;
            pool.release(&camera_name);
        });

        Ok((handle, join))
    }

    fn log_path(
        &self,
        prefix: &str,
        explicit: Option<PathBuf>,
        started: time::OffsetDateTime,
    ) -> PathBuf {
        explicit.unwrap_or_else(|| self.config.log_dir.join(timestamped_name(prefix, started)))
    }
}
