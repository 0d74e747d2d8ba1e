mod chat;
mod chunking;
mod config;
mod ids;
mod presenter;
mod readiness;
mod status;
mod stream_event;
mod video;

pub use chat::{ChatMessage, HistoryEntry, MessageHistory};
pub use chunking::{
    split_into_chunks, text_script_chunks, AudioChunker, ChunkError, DEFAULT_AUDIO_CHUNK_SIZE,
    DEFAULT_BREAK,
};
pub use config::{ApiConfig, ConfigError, PLACEHOLDER_KEY};
pub use ids::{AgentId, ChatId, SessionId, StreamId};
pub use presenter::{PresenterInput, PresenterType, Service};
pub use readiness::StreamReadiness;
pub use status::{StatusBoard, StatusKey, StatusUpdate};
pub use stream_event::{AgentChannelMessage, StreamEvent};
pub use video::{LayerMode, VideoActivityMonitor, VideoLayers, VideoStatus, VisibleLayer};
