use avatar_session_core::protocol::IceCandidate;
use std::fmt;

/// ICE connection state, mirrors `RTCIceConnectionState`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IceConnectionState {
    New,
    Checking,
    Connected,
    Completed,
    Disconnected,
    Failed,
    Closed,
    Unspecified,
}

impl IceConnectionState {
    /// States after which the peer connection is torn down
    pub fn is_terminal(&self) -> bool {
        matches!(self, IceConnectionState::Failed | IceConnectionState::Closed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            IceConnectionState::New => "new",
            IceConnectionState::Checking => "checking",
            IceConnectionState::Connected => "connected",
            IceConnectionState::Completed => "completed",
            IceConnectionState::Disconnected => "disconnected",
            IceConnectionState::Failed => "failed",
            IceConnectionState::Closed => "closed",
            IceConnectionState::Unspecified => "unspecified",
        }
    }
}

impl fmt::Display for IceConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Peer connection state, mirrors `RTCPeerConnectionState`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
    Unspecified,
}

impl PeerConnectionState {
    pub fn label(&self) -> &'static str {
        match self {
            PeerConnectionState::New => "new",
            PeerConnectionState::Connecting => "connecting",
            PeerConnectionState::Connected => "connected",
            PeerConnectionState::Disconnected => "disconnected",
            PeerConnectionState::Failed => "failed",
            PeerConnectionState::Closed => "closed",
            PeerConnectionState::Unspecified => "unspecified",
        }
    }
}

impl fmt::Display for PeerConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Video,
    Audio,
}

/// Events emitted by the peer connection callbacks
#[derive(Debug, Clone, PartialEq)]
pub enum PeerEvent {
    IceGatheringStateChanged(String),
    IceConnectionStateChanged(IceConnectionState),
    ConnectionStateChanged(PeerConnectionState),
    SignalingStateChanged(String),
    /// Local candidate ready to be trickled to the server
    IceCandidate(IceCandidate),
    /// Gathering finished (null candidate)
    IceGatheringComplete,
    DataChannelOpen(String),
    /// Text received on the data channel named `label`
    DataChannelMessage { label: String, text: String },
    DataChannelClose(String),
    Track(TrackKind),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_ice_states() {
        assert!(IceConnectionState::Failed.is_terminal());
        assert!(IceConnectionState::Closed.is_terminal());
        assert!(!IceConnectionState::Disconnected.is_terminal());
        assert!(!IceConnectionState::Connected.is_terminal());
    }

    #[test]
    fn test_labels_match_browser_names() {
        assert_eq!(IceConnectionState::Completed.to_string(), "completed");
        assert_eq!(PeerConnectionState::Connecting.to_string(), "connecting");
    }
}
