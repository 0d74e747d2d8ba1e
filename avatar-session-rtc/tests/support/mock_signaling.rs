use async_trait::async_trait;
use avatar_session_core::protocol::{IceCandidate, SessionDescription};
use avatar_session_rtc::{Result, Signaling};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// One outbound signaling call
#[derive(Debug, Clone, PartialEq)]
pub enum SignalingCall {
    Answer(SessionDescription),
    Candidate(IceCandidate),
    EndOfCandidates,
}

/// Records signaling calls and optionally forwards them to the test
#[derive(Default)]
pub struct MockSignaling {
    calls: Mutex<Vec<SignalingCall>>,
    forward: Option<mpsc::UnboundedSender<SignalingCall>>,
}

impl MockSignaling {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock that also delivers every call on the returned receiver
    pub fn forwarding() -> (Self, mpsc::UnboundedReceiver<SignalingCall>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                calls: Mutex::new(Vec::new()),
                forward: Some(tx),
            },
            rx,
        )
    }

    pub fn calls(&self) -> Vec<SignalingCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn answers(&self) -> Vec<SessionDescription> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SignalingCall::Answer(answer) => Some(answer),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: SignalingCall) {
        if let Some(tx) = &self.forward {
            let _ = tx.send(call.clone());
        }
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Signaling for MockSignaling {
    async fn send_answer(&self, answer: &SessionDescription) -> Result<()> {
        self.record(SignalingCall::Answer(answer.clone()));
        Ok(())
    }

    async fn send_ice_candidate(&self, candidate: &IceCandidate) -> Result<()> {
        self.record(SignalingCall::Candidate(candidate.clone()));
        Ok(())
    }

    async fn send_end_of_candidates(&self) -> Result<()> {
        self.record(SignalingCall::EndOfCandidates);
        Ok(())
    }
}
