use avatar_session_core::{
    AgentId, ChatId, HistoryEntry, StatusUpdate, StreamEvent, VideoLayers, VideoStatus,
};

/// Progress of the agent setup workflow
#[derive(Debug, Clone, PartialEq)]
pub enum AgentSetup {
    Processing,
    Ready { agent_id: AgentId, chat_id: ChatId },
    Failed,
}

/// Events published by a session to its subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A status label changed
    Status(StatusUpdate),

    /// Inbound video started or stopped
    Video(VideoStatus),

    /// Visible layer state after a change
    Layers(VideoLayers),

    /// Message received on the stream data channel
    Stream(StreamEvent),

    /// Warmup finished, the stream may be shown
    StreamReady,

    /// Line appended to the chat transcript
    History(HistoryEntry),

    Agent(AgentSetup),

    /// Peer connection torn down
    Closed,
}
