//! Wire types for the avatar API (WebSocket streaming + REST agents)

mod rest;
mod sdp;
mod ws;

pub use rest::{
    document_id_suffix, AgentPresenter, ChatRequest, ChatResponse, CreateAgentRequest,
    CreateDocumentRequest, CreateKnowledgeRequest, CreateStreamRequest, CreateStreamResponse,
    CreatedResource, DeleteStreamRequest, Embedder, IceRequest, KnowledgeRef, LlmConfig,
    SdpRequest, StatusResponse, AGENT_PRESENTER_IMAGE,
};
pub use sdp::{IceCandidate, IceServerConfig, SdpType, SessionDescription};
pub use ws::{
    Background, DeleteStreamPayload, ExternalKey, ExternalKeys, IcePayload, InitStreamPayload,
    Script, SdpPayload, StreamConfig, StreamPayload, VoiceProvider, WsRequest, WsResponse,
};
