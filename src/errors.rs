#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid region: {0}")]
    InvalidRegion(&'static str),

    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("log write failed: {0}")]
    IoFailure(#[from] std::io::Error),

    #[error("unsupported protocol byte {0:#04x}")]
    ProtocolUnsupported(u8),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("engine already running")]
    AlreadyRunning,

    #[error("command channel closed")]
    ChannelClosed,
}
