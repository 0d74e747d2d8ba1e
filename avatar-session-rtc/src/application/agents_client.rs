use crate::application::config::ClientConfig;
use crate::application::events::{AgentSetup, SessionEvent};
use crate::application::session::{RtcSession, SessionKind};
use crate::infrastructure::{ApiHttp, RestSignaling, Result, RtcError};
use avatar_session_core::protocol::{
    document_id_suffix, ChatRequest, ChatResponse, CreateAgentRequest, CreateDocumentRequest,
    CreateKnowledgeRequest, CreateStreamRequest, CreateStreamResponse, CreatedResource,
    DeleteStreamRequest,
};
use avatar_session_core::{
    AgentId, ApiConfig, ChatId, ChatMessage, HistoryEntry, SessionId, StreamId,
};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

#[derive(Default)]
struct AgentHandle {
    agent_id: Option<AgentId>,
    chat_id: Option<ChatId>,
    stream_id: Option<StreamId>,
    session_id: Option<SessionId>,
}

/// Conversational agent over the REST stream endpoints.
///
/// Answers arrive on the data channel and are added to the transcript when
/// the avatar starts speaking them.
pub struct AgentsClient {
    api: ApiConfig,
    http: ApiHttp,
    session: RtcSession,
    handle: Mutex<AgentHandle>,
}

impl AgentsClient {
    pub fn new(api: ApiConfig, config: ClientConfig) -> Result<Self> {
        let http = ApiHttp::new(api.base_url(), &api.key, config.http_retry)?;
        let session = RtcSession::new(SessionKind::Agents, api.service, config);
        Ok(Self {
            api,
            http,
            session,
            handle: Mutex::new(AgentHandle::default()),
        })
    }

    /// Reuse a previously created agent and chat
    pub async fn with_agent(self, agent_id: AgentId, chat_id: ChatId) -> Self {
        {
            let mut handle = self.handle.lock().await;
            handle.agent_id = Some(agent_id);
            handle.chat_id = Some(chat_id);
        }
        self
    }

    pub fn session(&self) -> &RtcSession {
        &self.session
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.session.subscribe()
    }

    pub async fn agent(&self) -> Option<(AgentId, ChatId)> {
        let handle = self.handle.lock().await;
        handle.agent_id.clone().zip(handle.chat_id.clone())
    }

    /// Create a knowledge base with one document, an agent using it and a
    /// chat with that agent.
    #[tracing::instrument(skip(self))]
    pub async fn create_agent(&self) -> Result<(AgentId, ChatId)> {
        self.session.emit(SessionEvent::Agent(AgentSetup::Processing));

        match self.run_agent_workflow().await {
            Ok((agent_id, chat_id)) => {
                {
                    let mut handle = self.handle.lock().await;
                    handle.agent_id = Some(agent_id.clone());
                    handle.chat_id = Some(chat_id.clone());
                }
                tracing::info!("Agent {} ready with chat {}", agent_id, chat_id);
                self.session.emit(SessionEvent::Agent(AgentSetup::Ready {
                    agent_id: agent_id.clone(),
                    chat_id: chat_id.clone(),
                }));
                Ok((agent_id, chat_id))
            }
            Err(e) => {
                tracing::error!("Agent setup failed: {}", e);
                self.session.emit(SessionEvent::Agent(AgentSetup::Failed));
                Err(e)
            }
        }
    }

    async fn run_agent_workflow(&self) -> Result<(AgentId, ChatId)> {
        let knowledge: CreatedResource = self
            .http
            .post("/knowledge", &CreateKnowledgeRequest::default())
            .await?;
        tracing::info!("Knowledge ID: {}", knowledge.id);

        let document: CreatedResource = self
            .http
            .post(
                &format!("/knowledge/{}/documents", knowledge.id),
                &CreateDocumentRequest::default(),
            )
            .await?;
        let document_id = document_id_suffix(&document.id);
        tracing::info!("Document ID: {}", document_id);

        let poll = self.session.config().poll_retry;
        self.http
            .poll_until_done(
                &format!("/knowledge/{}/documents/{}", knowledge.id, document_id),
                poll,
            )
            .await?;
        self.http
            .poll_until_done(&format!("/knowledge/{}", knowledge.id), poll)
            .await?;

        let agent: CreatedResource = self
            .http
            .post("/agents", &CreateAgentRequest::demo(&knowledge.id))
            .await?;
        tracing::info!("Agent ID: {}", agent.id);

        let chat: CreatedResource = self
            .http
            .post_empty(&format!("/agents/{}/chat", agent.id))
            .await?;
        tracing::info!("Chat ID: {}", chat.id);

        Ok((AgentId::new(agent.id), ChatId::new(chat.id)))
    }

    /// Open a stream for the configured agent. A no-op when connected.
    #[tracing::instrument(skip(self))]
    pub async fn connect(&self) -> Result<()> {
        if self.agent().await.is_none() {
            return Err(RtcError::MissingAgent);
        }

        if self.session.is_connected() {
            tracing::info!("Already connected");
            return Ok(());
        }

        self.session.close().await;

        let service = self.api.service;
        let stream: CreateStreamResponse = self
            .http
            .post_with_retries(
                &format!("/{}/streams", service),
                &CreateStreamRequest::agent_presenter(),
            )
            .await?;
        tracing::info!("Stream {} created (session {})", stream.id, stream.session_id);

        {
            let mut handle = self.handle.lock().await;
            handle.stream_id = Some(stream.id.clone());
            handle.session_id = Some(stream.session_id.clone());
        }

        let signaling = Arc::new(RestSignaling::new(
            self.http.clone(),
            service,
            stream.id.clone(),
            stream.session_id.clone(),
        ));

        if let Err(e) = self
            .session
            .negotiate(&stream.offer, &stream.ice_servers, signaling)
            .await
        {
            tracing::error!("Error during streaming setup: {}", e);
            self.session.close().await;
            return Err(e);
        }

        Ok(())
    }

    /// Post a user message to the agent chat.
    ///
    /// Only allowed once signaling is stable or ICE is connected. A
    /// text-only reply (no video credits) is added to the transcript
    /// directly.
    pub async fn send_message(&self, text: &str) -> Result<ChatResponse> {
        if !self.session.can_send() {
            return Err(RtcError::NotConnected(
                "Peer connection not ready for chat".into(),
            ));
        }

        let (agent_id, chat_id, stream_id, session_id) = {
            let handle = self.handle.lock().await;
            match (
                &handle.agent_id,
                &handle.chat_id,
                &handle.stream_id,
                &handle.session_id,
            ) {
                (Some(agent), Some(chat), Some(stream), Some(session)) => {
                    (agent.clone(), chat.clone(), stream.clone(), session.clone())
                }
                (None, _, _, _) | (_, None, _, _) => return Err(RtcError::MissingAgent),
                _ => return Err(RtcError::NotConnected("No stream open".into())),
            }
        };

        self.session.record(HistoryEntry::User(text.to_string()));

        let request = ChatRequest {
            stream_id,
            session_id,
            messages: vec![ChatMessage::user(text, chrono::Local::now().to_rfc2822())],
        };
        let response: ChatResponse = self
            .http
            .post_with_retries(&format!("/agents/{}/chat/{}", agent_id, chat_id), &request)
            .await?;

        if response.is_text_only() {
            tracing::warn!("Account out of credit, agent replied with text only");
            if let Some(result) = &response.result {
                self.session.record(HistoryEntry::TextOnly(result.clone()));
            }
        }

        Ok(response)
    }

    /// Delete the stream and close the peer connection
    #[tracing::instrument(skip(self))]
    pub async fn destroy(&self) {
        let ids = {
            let mut handle = self.handle.lock().await;
            handle.stream_id.take().zip(handle.session_id.take())
        };

        if let Some((stream_id, session_id)) = ids {
            let path = format!("/{}/streams/{}", self.api.service, stream_id);
            if let Err(e) = self
                .http
                .delete(&path, &DeleteStreamRequest { session_id })
                .await
            {
                tracing::warn!("Failed to delete stream {}: {}", stream_id, e);
            }
        }

        self.session.close().await;
    }
}
