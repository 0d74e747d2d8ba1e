use crate::infrastructure::error::Result;
use crate::infrastructure::http::ApiHttp;
use crate::infrastructure::websocket::WsConnection;
use async_trait::async_trait;
use avatar_session_core::protocol::{
    IceCandidate, IcePayload, IceRequest, SdpPayload, SdpRequest, SessionDescription, WsRequest,
};
use avatar_session_core::{PresenterType, Service, SessionId, StreamId};
use std::sync::Arc;

/// Outbound half of offer/answer negotiation.
///
/// Abstracted so the session lifecycle can run over the WebSocket protocol,
/// the REST protocol, or a mock in tests.
#[async_trait]
pub trait Signaling: Send + Sync {
    async fn send_answer(&self, answer: &SessionDescription) -> Result<()>;

    async fn send_ice_candidate(&self, candidate: &IceCandidate) -> Result<()>;

    /// Gathering finished. Transports without an end marker ignore this.
    async fn send_end_of_candidates(&self) -> Result<()>;
}

/// Signaling over the streaming WebSocket
pub struct WsSignaling {
    ws: Arc<WsConnection>,
    stream_id: StreamId,
    session_id: SessionId,
    presenter_type: PresenterType,
}

impl WsSignaling {
    pub fn new(
        ws: Arc<WsConnection>,
        stream_id: StreamId,
        session_id: SessionId,
        presenter_type: PresenterType,
    ) -> Self {
        Self {
            ws,
            stream_id,
            session_id,
            presenter_type,
        }
    }
}

#[async_trait]
impl Signaling for WsSignaling {
    async fn send_answer(&self, answer: &SessionDescription) -> Result<()> {
        self.ws.send(&WsRequest::Sdp(SdpPayload {
            answer: answer.clone(),
            session_id: self.session_id.clone(),
            presenter_type: self.presenter_type,
        }))
    }

    async fn send_ice_candidate(&self, candidate: &IceCandidate) -> Result<()> {
        self.ws.send(&WsRequest::Ice(IcePayload::Candidate {
            session_id: self.session_id.clone(),
            candidate: candidate.clone(),
        }))
    }

    async fn send_end_of_candidates(&self) -> Result<()> {
        self.ws.send(&WsRequest::Ice(IcePayload::Complete {
            stream_id: self.stream_id.clone(),
            session_id: self.session_id.clone(),
            presenter_type: self.presenter_type,
        }))
    }
}

/// Signaling over the REST stream endpoints
pub struct RestSignaling {
    http: ApiHttp,
    service: Service,
    stream_id: StreamId,
    session_id: SessionId,
}

impl RestSignaling {
    pub fn new(http: ApiHttp, service: Service, stream_id: StreamId, session_id: SessionId) -> Self {
        Self {
            http,
            service,
            stream_id,
            session_id,
        }
    }

    fn stream_path(&self, suffix: &str) -> String {
        format!("/{}/streams/{}/{}", self.service.as_str(), self.stream_id, suffix)
    }
}

#[async_trait]
impl Signaling for RestSignaling {
    async fn send_answer(&self, answer: &SessionDescription) -> Result<()> {
        self.http
            .post_unit(
                &self.stream_path("sdp"),
                &SdpRequest {
                    answer: answer.clone(),
                    session_id: self.session_id.clone(),
                },
            )
            .await
    }

    async fn send_ice_candidate(&self, candidate: &IceCandidate) -> Result<()> {
        self.http
            .post_unit(
                &self.stream_path("ice"),
                &IceRequest {
                    candidate: candidate.clone(),
                    session_id: self.session_id.clone(),
                },
            )
            .await
    }

    async fn send_end_of_candidates(&self) -> Result<()> {
        Ok(())
    }
}
