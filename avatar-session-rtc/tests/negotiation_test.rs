mod support;

use avatar_session_core::protocol::{IceServerConfig, SdpType, SessionDescription};
use avatar_session_core::{Service, StatusKey};
use avatar_session_rtc::{ClientConfig, RtcSession, SessionEvent, SessionKind};
use std::sync::Arc;
use std::time::Duration;
use support::{MockSignaling, SignalingCall};
use webrtc::data_channel::RTCDataChannel;
use webrtc::ice_transport::ice_candidate::RTCIceCandidateInit;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

async fn local_offer(pc: &webrtc::peer_connection::RTCPeerConnection) -> SessionDescription {
    let offer = pc.create_offer(None).await.unwrap();
    let mut gathered = pc.gathering_complete_promise().await;
    pc.set_local_description(offer).await.unwrap();
    let _ = gathered.recv().await;

    let local = pc.local_description().await.unwrap();
    SessionDescription::offer(local.sdp)
}

#[tokio::test]
async fn test_negotiate_answers_offer() {
    support::init_tracing();

    let (server, _channel) = support::offering_peer().await;
    let offer = local_offer(&server).await;

    let session = RtcSession::new(SessionKind::Streaming, Service::Talks, ClientConfig::default());
    let signaling = Arc::new(MockSignaling::new());

    session
        .negotiate(&offer, &[IceServerConfig::stun("stun:127.0.0.1:3478")], signaling.clone())
        .await
        .expect("negotiation should succeed");

    let answers = signaling.answers();
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].sdp_type, SdpType::Answer);
    assert!(answers[0].sdp.contains("m=video"));
    assert!(answers[0].sdp.contains("m=application"));

    // Nothing may be trickled ahead of the answer
    assert!(matches!(signaling.calls()[0], SignalingCall::Answer(_)));

    session.close().await;
    server.close().await.unwrap();
}

fn ice_ufrag(sdp: &str) -> Option<&str> {
    sdp.lines()
        .find_map(|line| line.strip_prefix("a=ice-ufrag:"))
        .map(str::trim)
}

#[tokio::test]
async fn test_negotiate_twice_reuses_peer() {
    let (server, _channel) = support::offering_peer().await;
    let session = RtcSession::new(SessionKind::Streaming, Service::Talks, ClientConfig::default());
    let mut events = session.subscribe();
    let signaling = Arc::new(MockSignaling::new());
    let ice = [IceServerConfig::stun("stun:127.0.0.1:3478")];

    let offer = local_offer(&server).await;
    session.negotiate(&offer, &ice, signaling.clone()).await.unwrap();

    let first = signaling.answers()[0].clone();
    server
        .set_remote_description(RTCSessionDescription::answer(first.sdp).unwrap())
        .await
        .unwrap();

    let offer = local_offer(&server).await;
    session.negotiate(&offer, &ice, signaling.clone()).await.unwrap();

    let answers = signaling.answers();
    assert_eq!(answers.len(), 2);
    // A fresh peer connection would answer with new ICE credentials
    assert!(ice_ufrag(&answers[0].sdp).is_some());
    assert_eq!(ice_ufrag(&answers[0].sdp), ice_ufrag(&answers[1].sdp));

    while let Ok(event) = events.try_recv() {
        assert_ne!(event, SessionEvent::Closed);
    }

    session.close().await;
    server.close().await.unwrap();
}

#[tokio::test]
async fn test_close_resets_connection_status() {
    let (server, _channel) = support::offering_peer().await;
    let offer = local_offer(&server).await;

    let session = RtcSession::new(SessionKind::Streaming, Service::Talks, ClientConfig::default());
    let mut events = session.subscribe();

    session
        .negotiate(&offer, &[IceServerConfig::stun("stun:127.0.0.1:3478")], Arc::new(MockSignaling::new()))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    session.close().await;

    let status = session.status();
    assert_eq!(status.get(StatusKey::Signaling), "");
    assert_eq!(status.get(StatusKey::Peer), "");
    assert!(!session.is_connected());

    let mut closed = false;
    while let Ok(event) = events.try_recv() {
        if event == SessionEvent::Closed {
            closed = true;
        }
    }
    assert!(closed);

    server.close().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires UDP loopback between two local peers
async fn test_loopback_stream_ready() {
    support::init_tracing();

    let (server, _channel) = support::offering_peer().await;
    server.on_data_channel(Box::new(|channel: Arc<RTCDataChannel>| {
        let ready_channel = channel.clone();
        channel.on_open(Box::new(move || {
            Box::pin(async move {
                let _ = ready_channel.send_text("stream/ready:{}".to_string()).await;
            })
        }));
        Box::pin(async {})
    }));

    let offer = local_offer(&server).await;
    let session = RtcSession::new(SessionKind::Streaming, Service::Talks, ClientConfig::default());
    let (signaling, mut calls) = MockSignaling::forwarding();

    let forward_server = server.clone();
    tokio::spawn(async move {
        while let Some(call) = calls.recv().await {
            match call {
                SignalingCall::Answer(answer) => {
                    let answer = RTCSessionDescription::answer(answer.sdp).unwrap();
                    forward_server.set_remote_description(answer).await.unwrap();
                }
                SignalingCall::Candidate(candidate) => {
                    let _ = forward_server
                        .add_ice_candidate(RTCIceCandidateInit {
                            candidate: candidate.candidate,
                            sdp_mid: candidate.sdp_mid,
                            sdp_mline_index: candidate.sdp_mline_index,
                            username_fragment: None,
                        })
                        .await;
                }
                SignalingCall::EndOfCandidates => {}
            }
        }
    });

    session
        .negotiate(&offer, &[IceServerConfig::stun("stun:127.0.0.1:3478")], Arc::new(signaling))
        .await
        .unwrap();

    let became_ready = tokio::time::timeout(Duration::from_secs(15), async {
        while !session.is_ready() {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    })
    .await;

    assert!(became_ready.is_ok(), "stream never became ready");
    assert!(session.is_connected());
    assert_eq!(session.status().get(StatusKey::Peer), "connected");

    session.close().await;
    server.close().await.unwrap();
}
