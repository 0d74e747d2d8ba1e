mod peer_event;

pub use peer_event::{IceConnectionState, PeerConnectionState, PeerEvent, TrackKind};
