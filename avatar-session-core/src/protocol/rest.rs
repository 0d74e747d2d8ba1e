use crate::domain::{ChatMessage, PresenterInput, SessionId, StreamId};
use crate::protocol::{IceCandidate, IceServerConfig, SessionDescription, VoiceProvider};
use serde::{Deserialize, Serialize};

/// Presenter image used by the agents demo
pub const AGENT_PRESENTER_IMAGE: &str =
    "https://create-images-results.d-id.com/DefaultPresenters/Emma_f/v1_image.jpeg";

/// `POST /{service}/streams`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateStreamRequest {
    #[serde(flatten)]
    pub presenter: PresenterInput,
}

impl CreateStreamRequest {
    pub fn agent_presenter() -> Self {
        Self {
            presenter: PresenterInput::Talk {
                source_url: AGENT_PRESENTER_IMAGE.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateStreamResponse {
    pub id: StreamId,
    pub offer: SessionDescription,
    #[serde(default)]
    pub ice_servers: Vec<IceServerConfig>,
    pub session_id: SessionId,
}

/// `POST /{service}/streams/{id}/sdp`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SdpRequest {
    pub answer: SessionDescription,
    pub session_id: SessionId,
}

/// `POST /{service}/streams/{id}/ice`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IceRequest {
    #[serde(flatten)]
    pub candidate: IceCandidate,
    pub session_id: SessionId,
}

/// `DELETE /{service}/streams/{id}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteStreamRequest {
    pub session_id: SessionId,
}

/// `POST /agents/{agent}/chat/{chat}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub stream_id: StreamId,
    pub session_id: SessionId,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    #[serde(default)]
    pub chat_mode: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
}

impl ChatResponse {
    /// The account is out of credit and only text comes back
    pub fn is_text_only(&self) -> bool {
        self.chat_mode.as_deref() == Some("TextOnly")
    }
}

/// `POST /knowledge`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateKnowledgeRequest {
    pub name: String,
    pub description: String,
}

impl Default for CreateKnowledgeRequest {
    fn default() -> Self {
        Self {
            name: "knowledge".to_string(),
            description: "D-ID Agents API".to_string(),
        }
    }
}

/// `POST /knowledge/{id}/documents`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateDocumentRequest {
    #[serde(rename = "documentType")]
    pub document_type: String,
    pub source_url: String,
    pub title: String,
}

impl Default for CreateDocumentRequest {
    fn default() -> Self {
        Self {
            document_type: "pdf".to_string(),
            source_url:
                "https://d-id-public-bucket.s3.us-west-2.amazonaws.com/Prompt_engineering_Wikipedia.pdf"
                    .to_string(),
            title: "Prompt Engineering Wikipedia Page PDF".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Embedder {
    pub provider: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeRef {
    pub provider: String,
    pub embedder: Embedder,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentPresenter {
    #[serde(rename = "type")]
    pub kind: String,
    pub voice: VoiceProvider,
    pub thumbnail: String,
    pub source_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlmConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub provider: String,
    pub model: String,
    pub instructions: String,
    pub template: String,
}

/// `POST /agents`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateAgentRequest {
    pub knowledge: KnowledgeRef,
    pub presenter: AgentPresenter,
    pub llm: LlmConfig,
    pub preview_name: String,
}

impl CreateAgentRequest {
    /// RAG agent "Emma" grounded on the given knowledge base
    pub fn demo(knowledge_id: impl Into<String>) -> Self {
        Self {
            knowledge: KnowledgeRef {
                provider: "pinecone".to_string(),
                embedder: Embedder {
                    provider: "azure-open-ai".to_string(),
                    model: "text-large-003".to_string(),
                },
                id: knowledge_id.into(),
            },
            presenter: AgentPresenter {
                kind: "talk".to_string(),
                voice: VoiceProvider::microsoft("en-US-JennyMultilingualV2Neural"),
                thumbnail: AGENT_PRESENTER_IMAGE.to_string(),
                source_url: AGENT_PRESENTER_IMAGE.to_string(),
            },
            llm: LlmConfig {
                kind: "openai".to_string(),
                provider: "openai".to_string(),
                model: "gpt-3.5-turbo-1106".to_string(),
                instructions:
                    "Your name is Emma, an AI designed to assist with information about Prompt Engineering and RAG"
                        .to_string(),
                template: "rag-grounded".to_string(),
            },
            preview_name: "Emma".to_string(),
        }
    }
}

/// Body of any create call that answers with an id
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedResource {
    pub id: String,
}

/// Processing status of a knowledge base or document
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl StatusResponse {
    pub fn is_done(&self) -> bool {
        self.status.as_deref() == Some("done")
    }
}

/// Document ids come back as `<prefix>#<id>`; later calls take the `<id>` part
pub fn document_id_suffix(raw: &str) -> &str {
    raw.split('#').nth(1).unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_stream_agent_presenter() {
        let json = serde_json::to_value(CreateStreamRequest::agent_presenter()).unwrap();
        assert_eq!(json, json!({"source_url": AGENT_PRESENTER_IMAGE}));
    }

    #[test]
    fn test_parse_create_stream_response() {
        let raw = r#"{
            "id": "strm_abc",
            "offer": {"type": "offer", "sdp": "v=0"},
            "ice_servers": [{"urls": ["stun:stun.example.com"]}],
            "session_id": "AWSALB=xyz"
        }"#;
        let resp: CreateStreamResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.id.as_str(), "strm_abc");
        assert_eq!(resp.session_id.as_str(), "AWSALB=xyz");
        assert_eq!(resp.ice_servers[0].urls, vec!["stun:stun.example.com"]);
    }

    #[test]
    fn test_ice_request_shape() {
        let req = IceRequest {
            candidate: IceCandidate {
                candidate: "candidate:2".to_string(),
                sdp_mid: Some("1".to_string()),
                sdp_mline_index: Some(1),
            },
            session_id: SessionId::new("s"),
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"candidate": "candidate:2", "sdpMid": "1", "sdpMLineIndex": 1, "session_id": "s"})
        );
    }

    #[test]
    fn test_chat_request_uses_camel_case_ids() {
        let req = ChatRequest {
            stream_id: StreamId::new("strm"),
            session_id: SessionId::new("sess"),
            messages: vec![ChatMessage::user("hi", "now")],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["streamId"], "strm");
        assert_eq!(json["sessionId"], "sess");
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn test_chat_response_text_only() {
        let resp: ChatResponse =
            serde_json::from_str(r#"{"chatMode":"TextOnly","result":"Out of credit"}"#).unwrap();
        assert!(resp.is_text_only());
        assert_eq!(resp.result.as_deref(), Some("Out of credit"));

        let resp: ChatResponse = serde_json::from_str(r#"{"chatMode":"Functional"}"#).unwrap();
        assert!(!resp.is_text_only());
    }

    #[test]
    fn test_demo_agent_body() {
        let json = serde_json::to_value(CreateAgentRequest::demo("knl_1")).unwrap();
        assert_eq!(json["knowledge"]["id"], "knl_1");
        assert_eq!(json["knowledge"]["embedder"]["provider"], "azure-open-ai");
        assert_eq!(json["presenter"]["type"], "talk");
        assert_eq!(json["presenter"]["voice"]["voice_id"], "en-US-JennyMultilingualV2Neural");
        assert_eq!(json["llm"]["template"], "rag-grounded");
        assert_eq!(json["preview_name"], "Emma");
    }

    #[test]
    fn test_document_body() {
        let json = serde_json::to_value(CreateDocumentRequest::default()).unwrap();
        assert_eq!(json["documentType"], "pdf");
    }

    #[test]
    fn test_status_done() {
        let status: StatusResponse = serde_json::from_str(r#"{"id":"d","status":"done"}"#).unwrap();
        assert!(status.is_done());
        let status: StatusResponse = serde_json::from_str(r#"{"status":"processing"}"#).unwrap();
        assert!(!status.is_done());
    }

    #[test]
    fn test_document_id_suffix() {
        assert_eq!(document_id_suffix("knl_1#doc_9"), "doc_9");
        assert_eq!(document_id_suffix("doc_9"), "doc_9");
    }
}
