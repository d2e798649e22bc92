use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::EngineError;

/// Bounded-processing budgets for the serial loop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Max bytes pulled from the transport per tick.
    pub read_budget: usize,
    /// Max queued bytes decoded per tick.
    pub decode_budget: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            read_budget: 512,
            decode_budget: 256,
        }
    }
}

/// Main engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Device name resolved through the camera pool.
    pub camera: String,
    /// Frame-tick loop interval in milliseconds.
    pub frame_interval_ms: u64,
    /// Serial-tick loop interval in milliseconds.
    pub serial_interval_ms: u64,
    /// Directory for default-named log files.
    pub log_dir: PathBuf,
    /// Session log path; a timestamped name under `log_dir` when `None`.
    pub session_log: Option<PathBuf>,
    /// Sync log path; a timestamped name under `log_dir` when `None`.
    pub sync_log: Option<PathBuf>,
    pub sync: SyncConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            camera: "default".to_string(),
            frame_interval_ms: 50,
            serial_interval_ms: 10,
            log_dir: PathBuf::from("."),
            session_log: None,
            sync_log: None,
            sync: SyncConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
