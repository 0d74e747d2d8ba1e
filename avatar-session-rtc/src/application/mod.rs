mod agents_client;
mod config;
mod events;
mod session;
mod streaming_client;

pub use agents_client::AgentsClient;
pub use config::{ClientConfig, DEFAULT_TEXT_VOICE};
pub use events::{AgentSetup, SessionEvent};
pub use session::{RtcSession, SessionKind};
pub use streaming_client::StreamingClient;
