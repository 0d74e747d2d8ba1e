use crate::domain::{IceConnectionState, PeerConnectionState, PeerEvent, TrackKind};
use crate::infrastructure::error::Result;
use avatar_session_core::protocol::{IceCandidate, IceServerConfig, SessionDescription};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::APIBuilder;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::data_channel::RTCDataChannel;
use webrtc::ice_transport::ice_candidate::RTCIceCandidate;
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_gatherer_state::RTCIceGathererState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::signaling_state::RTCSignalingState;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_remote::TrackRemote;

/// Label of the locally created data channel
pub const DATA_CHANNEL_LABEL: &str = "JanusDataChannel";

/// Convert server supplied ICE servers into webrtc-rs configuration
pub fn build_ice_servers(servers: &[IceServerConfig]) -> Vec<RTCIceServer> {
    servers
        .iter()
        .map(|server| RTCIceServer {
            urls: server.urls.clone(),
            username: server.username.clone().unwrap_or_default(),
            credential: server.credential.clone().unwrap_or_default(),
            ..Default::default()
        })
        .collect()
}

/// Receive-only peer connection towards the avatar service.
///
/// All callbacks are forwarded as [`PeerEvent`]s on the channel given to
/// [`PeerConnection::create`]. Inbound RTP is drained in background tasks;
/// video payload bytes are counted so callers can sample activity.
pub struct PeerConnection {
    pc: Arc<RTCPeerConnection>,
    data_channel: Arc<RTCDataChannel>,
    video_bytes: Arc<AtomicU64>,
    closed: AtomicBool,
}

impl PeerConnection {
    pub async fn create(
        ice_servers: &[IceServerConfig],
        events: mpsc::UnboundedSender<PeerEvent>,
    ) -> Result<Self> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let ice_servers = build_ice_servers(ice_servers);
        tracing::info!(
            "Creating peer connection with {} ICE server(s)",
            ice_servers.len()
        );
        for server in &ice_servers {
            tracing::debug!("  ICE: {:?}", server.urls);
        }

        let pc = Arc::new(
            api.new_peer_connection(RTCConfiguration {
                ice_servers,
                ..Default::default()
            })
            .await?,
        );

        let video_bytes = Arc::new(AtomicU64::new(0));
        register_callbacks(&pc, &events, &video_bytes);

        let data_channel = pc.create_data_channel(DATA_CHANNEL_LABEL, None).await?;
        watch_data_channel(&data_channel, events);

        Ok(Self {
            pc,
            data_channel,
            video_bytes,
            closed: AtomicBool::new(false),
        })
    }

    /// Apply the remote offer and produce the local answer
    pub async fn answer(&self, offer: &SessionDescription) -> Result<SessionDescription> {
        let offer = RTCSessionDescription::offer(offer.sdp.clone())?;
        self.pc.set_remote_description(offer).await?;
        tracing::debug!("Set remote SDP");

        let answer = self.pc.create_answer(None).await?;
        tracing::debug!("Created local SDP");

        self.pc.set_local_description(answer.clone()).await?;
        tracing::debug!("Set local SDP");

        Ok(SessionDescription::answer(answer.sdp))
    }

    pub fn connection_state(&self) -> PeerConnectionState {
        self.pc.connection_state().into()
    }

    pub fn ice_connection_state(&self) -> IceConnectionState {
        self.pc.ice_connection_state().into()
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state() == PeerConnectionState::Connected
    }

    pub fn is_signaling_stable(&self) -> bool {
        self.pc.signaling_state() == RTCSignalingState::Stable
    }

    pub fn is_ice_connected(&self) -> bool {
        self.ice_connection_state() == IceConnectionState::Connected
    }

    /// Total inbound video payload bytes so far
    pub fn video_bytes_received(&self) -> u64 {
        self.video_bytes.load(Ordering::Relaxed)
    }

    pub fn data_channel_label(&self) -> &str {
        self.data_channel.label()
    }

    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.pc.close().await?;
        tracing::info!("Peer connection closed");
        Ok(())
    }
}

fn register_callbacks(
    pc: &Arc<RTCPeerConnection>,
    events: &mpsc::UnboundedSender<PeerEvent>,
    video_bytes: &Arc<AtomicU64>,
) {
    let tx = events.clone();
    pc.on_ice_gathering_state_change(Box::new(move |state: RTCIceGathererState| {
        let _ = tx.send(PeerEvent::IceGatheringStateChanged(state.to_string()));
        Box::pin(async {})
    }));

    let tx = events.clone();
    pc.on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
        let event = match candidate {
            Some(candidate) => match candidate.to_json() {
                Ok(init) => Some(PeerEvent::IceCandidate(IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_mline_index: init.sdp_mline_index,
                })),
                Err(e) => {
                    tracing::warn!("Dropping unserializable ICE candidate: {}", e);
                    None
                }
            },
            None => Some(PeerEvent::IceGatheringComplete),
        };
        if let Some(event) = event {
            let _ = tx.send(event);
        }
        Box::pin(async {})
    }));

    let tx = events.clone();
    pc.on_ice_connection_state_change(Box::new(move |state: RTCIceConnectionState| {
        let _ = tx.send(PeerEvent::IceConnectionStateChanged(state.into()));
        Box::pin(async {})
    }));

    let tx = events.clone();
    pc.on_peer_connection_state_change(Box::new(move |state: RTCPeerConnectionState| {
        let _ = tx.send(PeerEvent::ConnectionStateChanged(state.into()));
        Box::pin(async {})
    }));

    let tx = events.clone();
    pc.on_signaling_state_change(Box::new(move |state: RTCSignalingState| {
        let _ = tx.send(PeerEvent::SignalingStateChanged(state.to_string()));
        Box::pin(async {})
    }));

    let tx = events.clone();
    pc.on_data_channel(Box::new(move |channel: Arc<RTCDataChannel>| {
        tracing::debug!("Remote data channel '{}' announced", channel.label());
        watch_data_channel(&channel, tx.clone());
        Box::pin(async {})
    }));

    let tx = events.clone();
    let counter = video_bytes.clone();
    pc.on_track(Box::new(
        move |track: Arc<TrackRemote>,
              _receiver: Arc<RTCRtpReceiver>,
              _transceiver: Arc<RTCRtpTransceiver>| {
            let kind = if track.kind() == RTPCodecType::Video {
                TrackKind::Video
            } else {
                TrackKind::Audio
            };
            tracing::info!("Remote {:?} track {}", kind, track.id());

            let counter = counter.clone();
            tokio::spawn(async move {
                while let Ok((packet, _)) = track.read_rtp().await {
                    if kind == TrackKind::Video {
                        counter.fetch_add(packet.payload.len() as u64, Ordering::Relaxed);
                    }
                }
                tracing::debug!("Remote {:?} track ended", kind);
            });

            let _ = tx.send(PeerEvent::Track(kind));
            Box::pin(async {})
        },
    ));
}

fn watch_data_channel(channel: &Arc<RTCDataChannel>, events: mpsc::UnboundedSender<PeerEvent>) {
    let label = channel.label().to_string();

    let tx = events.clone();
    let open_label = label.clone();
    channel.on_open(Box::new(move || {
        tracing::debug!("Data channel '{}' open", open_label);
        let _ = tx.send(PeerEvent::DataChannelOpen(open_label));
        Box::pin(async {})
    }));

    let tx = events.clone();
    let message_label = label.clone();
    channel.on_message(Box::new(move |message: DataChannelMessage| {
        let text = String::from_utf8_lossy(&message.data).into_owned();
        let _ = tx.send(PeerEvent::DataChannelMessage {
            label: message_label.clone(),
            text,
        });
        Box::pin(async {})
    }));

    channel.on_close(Box::new(move || {
        let _ = events.send(PeerEvent::DataChannelClose(label.clone()));
        Box::pin(async {})
    }));
}

impl From<RTCIceConnectionState> for IceConnectionState {
    fn from(state: RTCIceConnectionState) -> Self {
        match state {
            RTCIceConnectionState::New => IceConnectionState::New,
            RTCIceConnectionState::Checking => IceConnectionState::Checking,
            RTCIceConnectionState::Connected => IceConnectionState::Connected,
            RTCIceConnectionState::Completed => IceConnectionState::Completed,
            RTCIceConnectionState::Disconnected => IceConnectionState::Disconnected,
            RTCIceConnectionState::Failed => IceConnectionState::Failed,
            RTCIceConnectionState::Closed => IceConnectionState::Closed,
            _ => IceConnectionState::Unspecified,
        }
    }
}

impl From<RTCPeerConnectionState> for PeerConnectionState {
    fn from(state: RTCPeerConnectionState) -> Self {
        match state {
            RTCPeerConnectionState::New => PeerConnectionState::New,
            RTCPeerConnectionState::Connecting => PeerConnectionState::Connecting,
            RTCPeerConnectionState::Connected => PeerConnectionState::Connected,
            RTCPeerConnectionState::Disconnected => PeerConnectionState::Disconnected,
            RTCPeerConnectionState::Failed => PeerConnectionState::Failed,
            RTCPeerConnectionState::Closed => PeerConnectionState::Closed,
            _ => PeerConnectionState::Unspecified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_stun_server() {
        let servers = build_ice_servers(&[IceServerConfig::stun("stun:stun.l.google.com:19302")]);

        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].urls, vec!["stun:stun.l.google.com:19302"]);
        assert!(servers[0].username.is_empty());
        assert!(servers[0].credential.is_empty());
    }

    #[test]
    fn test_build_turn_server_keeps_credentials() {
        let servers = build_ice_servers(&[IceServerConfig::turn(
            "turn:turn.example.com:3478",
            "user".to_string(),
            "pass".to_string(),
        )]);

        assert_eq!(servers[0].username, "user");
        assert_eq!(servers[0].credential, "pass");
    }

    #[test]
    fn test_state_conversion() {
        assert_eq!(
            IceConnectionState::from(RTCIceConnectionState::Failed),
            IceConnectionState::Failed
        );
        assert_eq!(
            PeerConnectionState::from(RTCPeerConnectionState::Connected),
            PeerConnectionState::Connected
        );
        assert_eq!(
            IceConnectionState::from(RTCIceConnectionState::Unspecified),
            IceConnectionState::Unspecified
        );
    }
}
