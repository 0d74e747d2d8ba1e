use avatar_session_core::{ChunkError, ConfigError};

/// Infrastructure layer errors
#[derive(Debug, thiserror::Error)]
pub enum RtcError {
    #[error("WebRTC error: {0}")]
    WebRtc(#[from] webrtc::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}: {body}")]
    HttpStatus {
        status: u16,
        url: String,
        body: String,
    },

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] Box<tokio_tungstenite::tungstenite::Error>),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Chunking error: {0}")]
    Chunk(#[from] ChunkError),

    #[error("Not connected: {0}")]
    NotConnected(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("No agent configured, create one first")]
    MissingAgent,

    #[error("Max retries exceeded: {0}")]
    MaxRetries(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Channel closed")]
    ChannelClosed,
}

impl From<tokio_tungstenite::tungstenite::Error> for RtcError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        RtcError::WebSocket(Box::new(e))
    }
}

pub type Result<T> = std::result::Result<T, RtcError>;
