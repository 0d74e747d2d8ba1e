#![allow(dead_code)]

pub mod mock_signaling;

pub use mock_signaling::{MockSignaling, SignalingCall};

use std::sync::Arc;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::APIBuilder;
use webrtc::data_channel::RTCDataChannel;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;

/// Local stand-in for the avatar server: offers video plus a data channel
pub async fn offering_peer() -> (Arc<RTCPeerConnection>, Arc<RTCDataChannel>) {
    let mut media_engine = MediaEngine::default();
    media_engine.register_default_codecs().unwrap();
    let registry = register_default_interceptors(Registry::new(), &mut media_engine).unwrap();

    let api = APIBuilder::new()
        .with_media_engine(media_engine)
        .with_interceptor_registry(registry)
        .build();

    let pc = Arc::new(
        api.new_peer_connection(RTCConfiguration::default())
            .await
            .unwrap(),
    );
    pc.add_transceiver_from_kind(RTPCodecType::Video, None)
        .await
        .unwrap();
    let channel = pc.create_data_channel("server", None).await.unwrap();

    (pc, channel)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("avatar_session_rtc=debug")
        .with_test_writer()
        .try_init();
}
