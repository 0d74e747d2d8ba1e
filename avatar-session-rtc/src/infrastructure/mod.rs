pub mod error;
pub mod http;
pub mod peer;
pub mod signaling;
pub mod tts;
pub mod websocket;

pub use error::{Result, RtcError};
pub use http::ApiHttp;
pub use peer::{build_ice_servers, PeerConnection, DATA_CHANNEL_LABEL};
pub use signaling::{RestSignaling, Signaling, WsSignaling};
pub use tts::{ElevenLabs, DEFAULT_TTS_MODEL, DEFAULT_TTS_VOICE, ELEVENLABS_URL};
pub use websocket::{authorized_url, WsConnection};
