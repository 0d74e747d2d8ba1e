use crate::application::config::ClientConfig;
use crate::application::events::SessionEvent;
use crate::domain::{PeerConnectionState, PeerEvent, TrackKind};
use crate::infrastructure::{PeerConnection, Result, Signaling, DATA_CHANNEL_LABEL};
use avatar_session_core::protocol::{IceCandidate, IceServerConfig, SessionDescription};
use avatar_session_core::{
    AgentChannelMessage, HistoryEntry, LayerMode, MessageHistory, Service, StatusBoard, StatusKey,
    StreamEvent, StreamReadiness, VideoActivityMonitor, VideoLayers,
};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

const EVENT_CAPACITY: usize = 256;

/// Which client drives the session; decides layer composition and how
/// data-channel messages are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// WebSocket streaming: stream events on the data channel, idle and
    /// stream layers cross-fade
    Streaming,
    /// REST agents: chat answers on the data channel, one shared layer
    Agents,
}

impl SessionKind {
    pub fn layer_mode(&self) -> LayerMode {
        match self {
            SessionKind::Streaming => LayerMode::Dual,
            SessionKind::Agents => LayerMode::Single,
        }
    }
}

struct SessionState {
    status: StatusBoard,
    readiness: StreamReadiness,
    monitor: VideoActivityMonitor,
    layers: VideoLayers,
    history: MessageHistory,
    pending_answer: Option<String>,
    signaling: Option<Arc<dyn Signaling>>,
    answer_sent: bool,
    /// Candidates gathered before the answer went out; `None` marks the end
    pending_candidates: Vec<Option<IceCandidate>>,
    sampler_running: bool,
}

struct Shared {
    kind: SessionKind,
    config: ClientConfig,
    state: Mutex<SessionState>,
    peer: Mutex<Option<Arc<PeerConnection>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    events: broadcast::Sender<SessionEvent>,
}

/// Peer connection lifecycle shared by the streaming and agents clients.
///
/// Owns the status board, warmup readiness, video activity detection and
/// layer state. Cheap to clone; all clones drive the same session.
#[derive(Clone)]
pub struct RtcSession {
    shared: Arc<Shared>,
}

impl RtcSession {
    pub fn new(kind: SessionKind, service: Service, config: ClientConfig) -> Self {
        let status = match kind {
            SessionKind::Streaming => StatusBoard::with_stream_events(),
            SessionKind::Agents => StatusBoard::new(),
        };

        let mut layers = VideoLayers::new(kind.layer_mode(), service.idle_video());
        if kind == SessionKind::Agents {
            layers.play_idle();
        }

        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            shared: Arc::new(Shared {
                kind,
                state: Mutex::new(SessionState {
                    status,
                    readiness: StreamReadiness::new(config.stream_warmup),
                    monitor: VideoActivityMonitor::new(),
                    layers,
                    history: MessageHistory::new(),
                    pending_answer: None,
                    signaling: None,
                    answer_sent: false,
                    pending_candidates: Vec::new(),
                    sampler_running: false,
                }),
                config,
                peer: Mutex::new(None),
                tasks: Mutex::new(Vec::new()),
                events,
            }),
        }
    }

    pub fn kind(&self) -> SessionKind {
        self.shared.kind
    }

    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }

    /// Answer `offer` and start trickling candidates through `signaling`.
    ///
    /// The peer connection is created on first use; later calls renegotiate
    /// on the same connection until `close`.
    #[tracing::instrument(skip_all, fields(kind = ?self.shared.kind))]
    pub async fn negotiate(
        &self,
        offer: &SessionDescription,
        ice_servers: &[IceServerConfig],
        signaling: Arc<dyn Signaling>,
    ) -> Result<()> {
        {
            let mut state = self.state();
            state.signaling = Some(signaling.clone());
            state.answer_sent = false;
            state.pending_candidates.clear();
        }

        let peer = match self.peer() {
            Some(peer) => {
                tracing::debug!("Reusing existing peer connection");
                peer
            }
            None => self.create_peer(ice_servers).await?,
        };

        let answer = peer.answer(offer).await?;
        signaling.send_answer(&answer).await?;
        tracing::info!("Answer sent");

        let pending = {
            let mut state = self.state();
            state.answer_sent = true;
            std::mem::take(&mut state.pending_candidates)
        };
        for candidate in pending {
            send_candidate(signaling.as_ref(), candidate).await;
        }

        Ok(())
    }

    /// Stop the stream and tear the peer connection down. Idempotent.
    #[tracing::instrument(skip(self))]
    pub async fn close(&self) {
        let tasks = std::mem::take(&mut *lock(&self.shared.tasks));
        for task in tasks {
            task.abort();
        }

        let layers = {
            let mut state = self.state();
            state.layers.stop_stream();
            state.layers.clone()
        };
        self.emit(SessionEvent::Layers(layers));

        let Some(peer) = lock(&self.shared.peer).take() else {
            return;
        };

        if let Err(e) = peer.close().await {
            tracing::warn!("Error while closing peer connection: {}", e);
        }

        let updates = {
            let mut state = self.state();
            state.readiness.reset();
            state.monitor.reset();
            state.sampler_running = false;
            state.signaling = None;
            state.answer_sent = false;
            state.pending_candidates.clear();
            state.pending_answer = None;
            state.status.reset_connection()
        };
        for update in updates {
            self.emit(SessionEvent::Status(update));
        }
        self.emit(SessionEvent::Closed);
    }

    pub fn is_connected(&self) -> bool {
        self.peer().map(|peer| peer.is_connected()).unwrap_or(false)
    }

    /// Whether chat messages may be sent (signaling stable or ICE connected)
    pub fn can_send(&self) -> bool {
        self.peer()
            .map(|peer| peer.is_signaling_stable() || peer.is_ice_connected())
            .unwrap_or(false)
    }

    pub fn is_ready(&self) -> bool {
        self.state().readiness.is_ready()
    }

    pub fn status(&self) -> StatusBoard {
        self.state().status.clone()
    }

    pub fn layers(&self) -> VideoLayers {
        self.state().layers.clone()
    }

    pub fn history(&self) -> MessageHistory {
        self.state().history.clone()
    }

    /// Append to the chat transcript
    pub fn record(&self, entry: HistoryEntry) {
        self.state().history.push(entry.clone());
        self.emit(SessionEvent::History(entry));
    }

    /// Relay an application event to subscribers
    pub fn emit(&self, event: SessionEvent) {
        let _ = self.shared.events.send(event);
    }

    async fn create_peer(&self, ice_servers: &[IceServerConfig]) -> Result<Arc<PeerConnection>> {
        let fallback_servers;
        let ice_servers = if ice_servers.is_empty() {
            tracing::warn!("No ICE servers offered, using public STUN");
            fallback_servers = IceServerConfig::default_stun_servers();
            &fallback_servers[..]
        } else {
            ice_servers
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let peer = Arc::new(PeerConnection::create(ice_servers, tx).await?);
        *lock(&self.shared.peer) = Some(peer.clone());

        let session = self.clone();
        self.spawn(async move { session.pump(rx).await });

        Ok(peer)
    }

    fn peer(&self) -> Option<Arc<PeerConnection>> {
        lock(&self.shared.peer).clone()
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        lock(&self.shared.state)
    }

    fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = lock(&self.shared.tasks);
        tasks.retain(|task| !task.is_finished());
        tasks.push(tokio::spawn(future));
    }

    async fn pump(&self, mut rx: mpsc::UnboundedReceiver<PeerEvent>) {
        while let Some(event) = rx.recv().await {
            self.handle_peer_event(event).await;
        }
        tracing::debug!("Peer event stream ended");
    }

    async fn handle_peer_event(&self, event: PeerEvent) {
        match event {
            PeerEvent::IceGatheringStateChanged(state) => {
                self.set_status(StatusKey::IceGathering, state);
            }
            PeerEvent::IceCandidate(candidate) => self.trickle(Some(candidate)).await,
            PeerEvent::IceGatheringComplete => self.trickle(None).await,
            PeerEvent::IceConnectionStateChanged(state) => {
                self.set_status(StatusKey::Ice, state.label());
                if state.is_terminal() {
                    tracing::warn!("ICE connection {}, closing session", state);
                    let session = self.clone();
                    tokio::spawn(async move { session.close().await });
                }
            }
            PeerEvent::ConnectionStateChanged(state) => {
                self.set_status(StatusKey::Peer, state.label());
                if state == PeerConnectionState::Connected
                    && self.shared.kind == SessionKind::Streaming
                {
                    self.on_peer_connected();
                }
            }
            PeerEvent::SignalingStateChanged(state) => {
                self.set_status(StatusKey::Signaling, state);
            }
            PeerEvent::DataChannelOpen(label) => {
                tracing::debug!("Data channel '{}' ready", label);
            }
            PeerEvent::DataChannelClose(label) => {
                tracing::debug!("Data channel '{}' closed", label);
            }
            PeerEvent::DataChannelMessage { label, text } if label == DATA_CHANNEL_LABEL => {
                match self.shared.kind {
                    SessionKind::Streaming => self.on_stream_message(&text),
                    SessionKind::Agents => self.on_agent_message(&text),
                }
            }
            PeerEvent::DataChannelMessage { label, .. } => {
                tracing::debug!("Ignoring message on data channel '{}'", label);
            }
            PeerEvent::Track(TrackKind::Video) => self.start_stats_sampler(),
            PeerEvent::Track(TrackKind::Audio) => {}
        }
    }

    fn set_status(&self, key: StatusKey, value: impl Into<String>) {
        let update = self.state().status.update(key, value);
        if let Some(update) = update {
            tracing::debug!("{}: {}", update.key.label(), update.value);
            self.emit(SessionEvent::Status(update));
        }
    }

    async fn trickle(&self, candidate: Option<IceCandidate>) {
        let signaling = {
            let mut state = self.state();
            if state.answer_sent {
                state.signaling.clone()
            } else {
                state.pending_candidates.push(candidate.clone());
                None
            }
        };

        if let Some(signaling) = signaling {
            send_candidate(signaling.as_ref(), candidate).await;
        }
    }

    fn on_peer_connected(&self) {
        let layers = {
            let mut state = self.state();
            state.layers.play_idle();
            state.layers.clone()
        };
        self.emit(SessionEvent::Layers(layers));

        let session = self.clone();
        let fallback = self.shared.config.ready_fallback();
        self.spawn(async move {
            tokio::time::sleep(fallback).await;
            if session.mark_ready() {
                tracing::info!("No stream/ready after {:?}, forcing ready", fallback);
            }
        });
    }

    fn on_stream_message(&self, message: &str) {
        let event = StreamEvent::parse(message);
        tracing::info!("Stream event: {}", event);
        self.emit(SessionEvent::Stream(event.clone()));

        if event == StreamEvent::Ready {
            let session = self.clone();
            let delay = self.shared.config.ready_delay();
            self.spawn(async move {
                tokio::time::sleep(delay).await;
                session.mark_ready();
                session.set_status(StatusKey::StreamEvent, "ready");
            });
        } else {
            self.set_status(StatusKey::StreamEvent, event.label());
        }
    }

    fn on_agent_message(&self, message: &str) {
        match AgentChannelMessage::parse(message) {
            AgentChannelMessage::Answer(answer) => {
                self.state().pending_answer = Some(answer);
            }
            AgentChannelMessage::StreamStarted => {
                let answer = self.state().pending_answer.take();
                if let Some(answer) = answer {
                    self.record(HistoryEntry::Agent(answer));
                }
            }
            AgentChannelMessage::Other(other) => {
                tracing::debug!("Data channel: {}", other);
            }
        }
    }

    /// Returns true if this call finished the warmup
    fn mark_ready(&self) -> bool {
        let (changed, update) = {
            let mut state = self.state();
            if state.readiness.mark_ready() {
                (true, state.status.update(StatusKey::StreamEvent, "ready"))
            } else {
                (false, None)
            }
        };

        if changed {
            self.emit(SessionEvent::StreamReady);
            if let Some(update) = update {
                self.emit(SessionEvent::Status(update));
            }
        }
        changed
    }

    fn start_stats_sampler(&self) {
        {
            let mut state = self.state();
            if state.sampler_running {
                return;
            }
            state.sampler_running = true;
        }

        let session = self.clone();
        let interval = self.shared.config.stats_interval();
        self.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let Some(peer) = session.peer() else {
                    break;
                };
                session.sample_video(peer.video_bytes_received());
            }
        });
    }

    /// Feed a video byte counter sample into activity detection
    fn sample_video(&self, bytes_received: u64) {
        let change = {
            let mut state = self.state();
            state.monitor.observe(bytes_received).map(|status| {
                let ready = state.readiness.is_ready();
                state.layers.on_video_status(status, ready);
                let update = state.status.update(StatusKey::Streaming, status.label());
                (status, update, state.layers.clone())
            })
        };

        if let Some((status, update, layers)) = change {
            tracing::info!("Video {}", status.label());
            self.emit(SessionEvent::Video(status));
            if let Some(update) = update {
                self.emit(SessionEvent::Status(update));
            }
            self.emit(SessionEvent::Layers(layers));
        }
    }
}

async fn send_candidate(signaling: &dyn Signaling, candidate: Option<IceCandidate>) {
    let result = match &candidate {
        Some(candidate) => signaling.send_ice_candidate(candidate).await,
        None => signaling.send_end_of_candidates().await,
    };
    if let Err(e) = result {
        tracing::error!("Failed to send ICE candidate: {}", e);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IceConnectionState;
    use async_trait::async_trait;
    use avatar_session_core::{StatusUpdate, VideoStatus, VisibleLayer};
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSignaling {
        sent: Mutex<Vec<String>>,
    }

    impl RecordingSignaling {
        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Signaling for RecordingSignaling {
        async fn send_answer(&self, _answer: &SessionDescription) -> Result<()> {
            self.sent.lock().unwrap().push("answer".to_string());
            Ok(())
        }

        async fn send_ice_candidate(&self, candidate: &IceCandidate) -> Result<()> {
            self.sent.lock().unwrap().push(candidate.candidate.clone());
            Ok(())
        }

        async fn send_end_of_candidates(&self) -> Result<()> {
            self.sent.lock().unwrap().push("end".to_string());
            Ok(())
        }
    }

    fn candidate(name: &str) -> IceCandidate {
        IceCandidate {
            candidate: name.to_string(),
            sdp_mid: Some("0".to_string()),
            sdp_mline_index: Some(0),
        }
    }

    fn streaming() -> RtcSession {
        RtcSession::new(SessionKind::Streaming, Service::Talks, ClientConfig::default())
    }

    fn channel_message(text: &str) -> PeerEvent {
        PeerEvent::DataChannelMessage {
            label: DATA_CHANNEL_LABEL.to_string(),
            text: text.to_string(),
        }
    }

    fn drain(rx: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_candidates_wait_for_answer() {
        let session = streaming();
        let signaling = Arc::new(RecordingSignaling::default());
        session.state().signaling = Some(signaling.clone());

        session
            .handle_peer_event(PeerEvent::IceCandidate(candidate("c1")))
            .await;
        assert!(signaling.sent().is_empty());

        let pending = {
            let mut state = session.state();
            state.answer_sent = true;
            std::mem::take(&mut state.pending_candidates)
        };
        for c in pending {
            send_candidate(signaling.as_ref(), c).await;
        }
        session
            .handle_peer_event(PeerEvent::IceCandidate(candidate("c2")))
            .await;
        session.handle_peer_event(PeerEvent::IceGatheringComplete).await;

        assert_eq!(signaling.sent(), vec!["c1", "c2", "end"]);
    }

    #[tokio::test]
    async fn test_status_updates_only_on_change() {
        let session = streaming();
        let mut rx = session.subscribe();

        session
            .handle_peer_event(PeerEvent::SignalingStateChanged("stable".to_string()))
            .await;
        session
            .handle_peer_event(PeerEvent::SignalingStateChanged("stable".to_string()))
            .await;

        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![SessionEvent::Status(StatusUpdate {
                key: StatusKey::Signaling,
                value: "stable".to_string()
            })]
        );
        assert_eq!(session.status().get(StatusKey::Signaling), "stable");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_ready_after_delay() {
        let session = streaming();
        assert!(!session.is_ready());

        session
            .handle_peer_event(channel_message("stream/ready:"))
            .await;
        assert!(!session.is_ready());

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(session.is_ready());
        assert_eq!(session.status().get(StatusKey::StreamEvent), "ready");
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_fallback_after_connect() {
        let session = streaming();

        session
            .handle_peer_event(PeerEvent::ConnectionStateChanged(
                PeerConnectionState::Connected,
            ))
            .await;
        assert!(session.layers().is_idle_loaded());

        tokio::time::sleep(Duration::from_millis(4900)).await;
        assert!(!session.is_ready());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(session.is_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_ready_status_without_warmup() {
        let session = RtcSession::new(
            SessionKind::Streaming,
            Service::Talks,
            ClientConfig::default().with_warmup(false),
        );
        let mut rx = session.subscribe();
        assert!(session.is_ready());

        session
            .handle_peer_event(channel_message("stream/ready:"))
            .await;
        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(session.status().get(StatusKey::StreamEvent), "ready");
        assert!(!drain(&mut rx).contains(&SessionEvent::StreamReady));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_ready_after_fallback_overrides_started() {
        let session = streaming();

        session
            .handle_peer_event(PeerEvent::ConnectionStateChanged(
                PeerConnectionState::Connected,
            ))
            .await;
        tokio::time::sleep(Duration::from_millis(5100)).await;
        assert!(session.is_ready());

        session
            .handle_peer_event(channel_message("stream/started:{}"))
            .await;
        assert_eq!(session.status().get(StatusKey::StreamEvent), "started");

        session
            .handle_peer_event(channel_message("stream/ready:"))
            .await;
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(session.status().get(StatusKey::StreamEvent), "ready");
    }

    #[tokio::test]
    async fn test_messages_on_other_channels_are_ignored() {
        let session = streaming();

        session
            .handle_peer_event(PeerEvent::DataChannelMessage {
                label: "server".to_string(),
                text: "stream/started:{}".to_string(),
            })
            .await;
        assert_eq!(session.status().get(StatusKey::StreamEvent), "");

        session
            .handle_peer_event(channel_message("stream/started:{}"))
            .await;
        assert_eq!(session.status().get(StatusKey::StreamEvent), "started");
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_stats_interval_keeps_sampling() {
        let session = RtcSession::new(
            SessionKind::Streaming,
            Service::Talks,
            ClientConfig::default().with_stats_interval(0),
        );

        session
            .handle_peer_event(PeerEvent::Track(TrackKind::Video))
            .await;
        assert!(session.state().sampler_running);

        // Without a peer the sampler returns on its first tick
        let tasks = std::mem::take(&mut *lock(&session.shared.tasks));
        assert_eq!(tasks.len(), 1);
        for task in tasks {
            assert!(task.await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_other_stream_events_keep_raw_name() {
        let session = streaming();

        session
            .handle_peer_event(channel_message("stream/started:{}"))
            .await;
        assert_eq!(session.status().get(StatusKey::StreamEvent), "started");

        session
            .handle_peer_event(channel_message("custom/thing:x"))
            .await;
        assert_eq!(session.status().get(StatusKey::StreamEvent), "custom/thing");
    }

    #[tokio::test]
    async fn test_video_hidden_until_ready() {
        let session = streaming();
        let mut rx = session.subscribe();

        session.sample_video(1200);
        assert_eq!(session.status().get(StatusKey::Streaming), "streaming");
        assert_eq!(session.layers().stream_opacity(), 0.0);
        assert!(drain(&mut rx).contains(&SessionEvent::Video(VideoStatus::Streaming)));

        session.sample_video(1200);
        assert_eq!(session.status().get(StatusKey::Streaming), "empty");

        session.mark_ready();
        session.sample_video(2400);
        assert_eq!(session.layers().stream_opacity(), 1.0);
        assert_eq!(session.layers().visible(), VisibleLayer::Stream);
    }

    #[tokio::test]
    async fn test_agent_answer_recorded_when_speech_starts() {
        let session = RtcSession::new(SessionKind::Agents, Service::Talks, ClientConfig::default());
        assert_eq!(session.layers().visible(), VisibleLayer::Idle);

        session
            .handle_peer_event(channel_message("chat/answer:Hello%20there"))
            .await;
        assert!(session.history().is_empty());

        session
            .handle_peer_event(channel_message("stream/started"))
            .await;
        assert_eq!(
            session.history().entries(),
            &[HistoryEntry::Agent("Hello there".to_string())]
        );
    }

    #[tokio::test]
    async fn test_terminal_ice_state_without_peer_is_harmless() {
        let session = streaming();

        session
            .handle_peer_event(PeerEvent::IceConnectionStateChanged(
                IceConnectionState::Failed,
            ))
            .await;
        tokio::task::yield_now().await;

        assert_eq!(session.status().get(StatusKey::Ice), "failed");
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn test_close_without_peer_is_noop() {
        let session = streaming();
        session.close().await;
        session.close().await;
        assert!(!session.is_connected());
        assert!(!session.can_send());
    }
}
