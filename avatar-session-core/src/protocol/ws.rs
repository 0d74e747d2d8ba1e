use crate::domain::{PresenterInput, PresenterType, SessionId, StreamId};
use crate::protocol::{IceCandidate, IceServerConfig, SessionDescription};
use serde::{Deserialize, Serialize};

/// Client → server message on the streaming WebSocket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum WsRequest {
    InitStream(InitStreamPayload),
    Sdp(SdpPayload),
    Ice(IcePayload),
    StreamText(StreamPayload),
    StreamAudio(StreamPayload),
    DeleteStream(DeleteStreamPayload),
}

impl WsRequest {
    /// Message type as it appears on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            WsRequest::InitStream(_) => "init-stream",
            WsRequest::Sdp(_) => "sdp",
            WsRequest::Ice(_) => "ice",
            WsRequest::StreamText(_) => "stream-text",
            WsRequest::StreamAudio(_) => "stream-audio",
            WsRequest::DeleteStream(_) => "delete-stream",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitStreamPayload {
    #[serde(flatten)]
    pub presenter: PresenterInput,
    pub presenter_type: PresenterType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdpPayload {
    pub answer: SessionDescription,
    pub session_id: SessionId,
    pub presenter_type: PresenterType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IcePayload {
    Candidate {
        session_id: SessionId,
        #[serde(flatten)]
        candidate: IceCandidate,
    },
    /// Sent once gathering finished (null candidate)
    Complete {
        stream_id: StreamId,
        session_id: SessionId,
        presenter_type: PresenterType,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteStreamPayload {
    pub session_id: SessionId,
    pub stream_id: StreamId,
}

/// Script for a streamed chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Script {
    Text {
        input: String,
        provider: VoiceProvider,
        ssml: bool,
    },
    /// Raw 16 kHz PCM bytes, encoded as a JSON number array
    Audio { input: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceProvider {
    #[serde(rename = "type")]
    pub kind: String,
    pub voice_id: String,
}

impl VoiceProvider {
    pub fn microsoft(voice_id: impl Into<String>) -> Self {
        Self {
            kind: "microsoft".to_string(),
            voice_id: voice_id.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    pub stitch: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Background {
    pub color: String,
}

impl Default for Background {
    fn default() -> Self {
        Self {
            color: "#FFFFFF".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalKey {
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalKeys {
    pub elevenlabs: ExternalKey,
}

/// Payload shared by `stream-text` and `stream-audio`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamPayload {
    pub script: Script,
    pub config: StreamConfig,
    #[serde(
        rename = "apiKeysExternal",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub api_keys_external: Option<ExternalKeys>,
    pub background: Background,
    /// Chunk order; lets the server reassemble out-of-order chunks
    pub index: usize,
    pub session_id: SessionId,
    pub stream_id: StreamId,
    pub presenter_type: PresenterType,
}

/// Server → client message on the streaming WebSocket
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "messageType", rename_all = "kebab-case")]
pub enum WsResponse {
    InitStream {
        id: StreamId,
        offer: SessionDescription,
        #[serde(default)]
        ice_servers: Vec<IceServerConfig>,
        session_id: SessionId,
    },
    Sdp {
        #[serde(flatten)]
        body: serde_json::Map<String, serde_json::Value>,
    },
    DeleteStream {
        #[serde(flatten)]
        body: serde_json::Map<String, serde_json::Value>,
    },
    #[serde(other)]
    Unknown,
}
