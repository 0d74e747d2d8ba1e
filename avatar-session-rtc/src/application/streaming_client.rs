use crate::application::config::ClientConfig;
use crate::application::events::SessionEvent;
use crate::application::session::{RtcSession, SessionKind};
use crate::infrastructure::{ElevenLabs, Result, RtcError, WsConnection, WsSignaling};
use avatar_session_core::domain::{text_script_chunks, AudioChunker, DEFAULT_BREAK};
use avatar_session_core::protocol::{
    Background, DeleteStreamPayload, ExternalKey, ExternalKeys, InitStreamPayload, Script,
    StreamConfig, StreamPayload, VoiceProvider, WsRequest, WsResponse,
};
use avatar_session_core::{ApiConfig, PresenterInput, SessionId, StreamId};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;

#[derive(Default)]
struct StreamHandle {
    ws: Option<Arc<WsConnection>>,
    stream_id: Option<StreamId>,
    session_id: Option<SessionId>,
    listener: Option<JoinHandle<()>>,
}

/// Avatar streaming over the WebSocket protocol.
///
/// `connect` opens the socket, requests a stream and negotiates the peer
/// connection. Text and audio scripts are then pushed as indexed chunks.
pub struct StreamingClient {
    api: ApiConfig,
    session: RtcSession,
    handle: Mutex<StreamHandle>,
}

impl StreamingClient {
    pub fn new(api: ApiConfig, config: ClientConfig) -> Self {
        let session = RtcSession::new(SessionKind::Streaming, api.service, config);
        Self {
            api,
            session,
            handle: Mutex::new(StreamHandle::default()),
        }
    }

    pub fn session(&self) -> &RtcSession {
        &self.session
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.session.subscribe()
    }

    pub async fn stream_id(&self) -> Option<StreamId> {
        self.handle.lock().await.stream_id.clone()
    }

    /// Open the stream. A no-op when the peer is already connected.
    #[tracing::instrument(skip(self))]
    pub async fn connect(&self) -> Result<()> {
        if self.session.is_connected() {
            tracing::info!("Already connected");
            return Ok(());
        }

        self.teardown().await;

        let url = self
            .api
            .websocket_url
            .as_deref()
            .ok_or_else(|| RtcError::ConnectionFailed("websocketUrl missing from config".into()))?;

        let (ws, mut inbound) = WsConnection::connect(url, &self.api.key).await?;
        let ws = Arc::new(ws);

        let presenter_type = self.api.presenter_type();
        ws.send(&WsRequest::InitStream(InitStreamPayload {
            presenter: PresenterInput::default_for(self.api.service),
            presenter_type,
        }))?;

        let timeout = self.session.config().connect_timeout();
        let init = tokio::time::timeout(timeout, wait_for_init(&mut inbound))
            .await
            .map_err(|_| RtcError::Timeout("no init-stream response".into()))?;

        let Some((stream_id, offer, ice_servers, session_id)) = init else {
            ws.close();
            return Err(RtcError::ConnectionFailed(
                "WebSocket closed before init-stream".into(),
            ));
        };
        tracing::info!("Stream {} created (session {})", stream_id, session_id);

        {
            let mut handle = self.handle.lock().await;
            handle.ws = Some(ws.clone());
            handle.stream_id = Some(stream_id.clone());
            handle.session_id = Some(session_id.clone());
            handle.listener = Some(tokio::spawn(listen(inbound)));
        }

        let signaling = Arc::new(WsSignaling::new(
            ws,
            stream_id,
            session_id,
            presenter_type,
        ));

        if let Err(e) = self
            .session
            .negotiate(&offer, &ice_servers, signaling)
            .await
        {
            tracing::error!("Error during streaming setup: {}", e);
            self.session.close().await;
            return Err(e);
        }

        Ok(())
    }

    /// Speak `text` with the Microsoft voice. With a `continuation` a
    /// three second break is inserted between both parts.
    ///
    /// Returns the number of chunks sent, including the end marker.
    pub async fn stream_text(&self, text: &str, continuation: Option<&str>) -> Result<usize> {
        let (ws, stream_id, session_id) = self.connected_handle().await?;

        let break_tag = continuation.map(|_| DEFAULT_BREAK);
        let chunks = text_script_chunks(text, break_tag, continuation);
        let voice = VoiceProvider::microsoft(&self.session.config().text_voice_id);

        for (index, chunk) in chunks.iter().enumerate() {
            ws.send(&WsRequest::StreamText(StreamPayload {
                script: Script::Text {
                    input: format!("{} ", chunk),
                    provider: voice.clone(),
                    ssml: true,
                },
                config: StreamConfig { stitch: true },
                api_keys_external: Some(ExternalKeys {
                    elevenlabs: ExternalKey { key: String::new() },
                }),
                background: Background::default(),
                index,
                session_id: session_id.clone(),
                stream_id: stream_id.clone(),
                presenter_type: self.api.presenter_type(),
            }))?;
        }

        tracing::info!("Streamed {} text chunk(s)", chunks.len());
        Ok(chunks.len())
    }

    /// Synthesize `text` with ElevenLabs and stream the PCM as audio chunks,
    /// closed by an empty chunk.
    ///
    /// Returns the number of chunks sent, including the end marker.
    pub async fn stream_audio(&self, text: &str) -> Result<usize> {
        let (ws, stream_id, session_id) = self.connected_handle().await?;
        let key = self.api.require_elevenlabs_key()?;

        let config = self.session.config();
        let tts = ElevenLabs::new(key)
            .with_base_url(&config.tts_url)
            .with_model(&config.tts_model_id);
        let mut pcm = tts.stream_pcm(text, &config.tts_voice_id).await?;

        let send = |input: Vec<u8>, index: usize| {
            ws.send(&WsRequest::StreamAudio(StreamPayload {
                script: Script::Audio { input },
                config: StreamConfig { stitch: true },
                api_keys_external: None,
                background: Background::default(),
                index,
                session_id: session_id.clone(),
                stream_id: stream_id.clone(),
                presenter_type: self.api.presenter_type(),
            }))
        };

        let mut chunker = AudioChunker::new(config.audio_chunk_size)?;
        while let Some(bytes) = pcm.next().await {
            let bytes = bytes?;
            for (index, chunk) in chunker.push(&bytes) {
                send(chunk.to_vec(), index)?;
            }
        }
        let end = chunker.finish();
        send(Vec::new(), end)?;

        tracing::info!("Streamed {} audio chunk(s)", end + 1);
        Ok(end + 1)
    }

    /// Delete the stream and close everything
    #[tracing::instrument(skip(self))]
    pub async fn destroy(&self) {
        {
            let handle = self.handle.lock().await;
            if let (Some(ws), Some(stream_id), Some(session_id)) =
                (&handle.ws, &handle.stream_id, &handle.session_id)
            {
                let request = WsRequest::DeleteStream(DeleteStreamPayload {
                    session_id: session_id.clone(),
                    stream_id: stream_id.clone(),
                });
                if let Err(e) = ws.send(&request) {
                    tracing::warn!("Failed to send delete-stream: {}", e);
                }
            }
        }

        self.teardown().await;
    }

    async fn teardown(&self) {
        let previous = std::mem::take(&mut *self.handle.lock().await);
        if let Some(listener) = previous.listener {
            listener.abort();
        }
        if let Some(ws) = previous.ws {
            ws.close();
        }
        self.session.close().await;
    }

    async fn connected_handle(&self) -> Result<(Arc<WsConnection>, StreamId, SessionId)> {
        let handle = self.handle.lock().await;
        match (&handle.ws, &handle.stream_id, &handle.session_id) {
            (Some(ws), Some(stream_id), Some(session_id)) if ws.is_open() => {
                Ok((ws.clone(), stream_id.clone(), session_id.clone()))
            }
            _ => Err(RtcError::NotConnected(
                "Stream not connected, call connect first".into(),
            )),
        }
    }
}

type InitStream = (
    StreamId,
    avatar_session_core::protocol::SessionDescription,
    Vec<avatar_session_core::protocol::IceServerConfig>,
    SessionId,
);

async fn wait_for_init(inbound: &mut mpsc::UnboundedReceiver<WsResponse>) -> Option<InitStream> {
    while let Some(message) = inbound.recv().await {
        match message {
            WsResponse::InitStream {
                id,
                offer,
                ice_servers,
                session_id,
            } => return Some((id, offer, ice_servers, session_id)),
            other => tracing::debug!("Ignoring {:?} before init-stream", other),
        }
    }
    None
}

async fn listen(mut inbound: mpsc::UnboundedReceiver<WsResponse>) {
    while let Some(message) = inbound.recv().await {
        match message {
            WsResponse::Sdp { body } => tracing::info!("SDP acknowledged: {:?}", body),
            WsResponse::DeleteStream { body } => tracing::info!("Stream deleted: {:?}", body),
            WsResponse::InitStream { id, .. } => {
                tracing::warn!("Unexpected second init-stream for {}", id)
            }
            WsResponse::Unknown => tracing::debug!("Unhandled WebSocket message"),
        }
    }
    tracing::info!("WebSocket message stream ended");
}
