// Domain layer (peer events and states)
pub mod domain;

// Application layer (session lifecycle and clients)
pub mod application;

// Infrastructure layer (WebRTC, WebSocket, REST, TTS adapters)
pub mod infrastructure;

// Re-exports for convenience
pub use application::{
    AgentSetup, AgentsClient, ClientConfig, RtcSession, SessionEvent, SessionKind,
    StreamingClient,
};
pub use domain::{IceConnectionState, PeerConnectionState, PeerEvent, TrackKind};
pub use infrastructure::signaling::Signaling;
pub use infrastructure::error::{Result, RtcError};
