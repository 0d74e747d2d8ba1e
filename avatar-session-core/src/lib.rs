// Domain layer (pure state, no I/O)
pub mod domain;

// Application policies
pub mod application;

// Wire protocol
pub mod protocol;

pub use application::RetryPolicy;
pub use domain::{
    AgentChannelMessage, AgentId, ApiConfig, ChatId, ChatMessage, ChunkError, ConfigError,
    HistoryEntry, LayerMode, MessageHistory, PresenterInput, PresenterType, Service, SessionId,
    StatusBoard, StatusKey, StatusUpdate, StreamEvent, StreamId, StreamReadiness,
    VideoActivityMonitor, VideoLayers, VideoStatus, VisibleLayer,
};
