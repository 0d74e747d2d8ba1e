use std::fmt;

/// Stream lifecycle event received on the data channel (`<event>:<payload>`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Started,
    Done,
    /// Warmup finished, streamed video may be shown
    Ready,
    Error,
    /// Anything else; carries the raw event name
    Other(String),
}

impl StreamEvent {
    pub fn parse(message: &str) -> Self {
        let event = message.split(':').next().unwrap_or_default();

        match event {
            "stream/started" => StreamEvent::Started,
            "stream/done" => StreamEvent::Done,
            "stream/ready" => StreamEvent::Ready,
            "stream/error" => StreamEvent::Error,
            other => StreamEvent::Other(other.to_string()),
        }
    }

    /// Value shown in the `StreamEvent` status slot
    pub fn label(&self) -> &str {
        match self {
            StreamEvent::Started => "started",
            StreamEvent::Done => "done",
            StreamEvent::Ready => "ready",
            StreamEvent::Error => "error",
            StreamEvent::Other(raw) => raw,
        }
    }
}

impl fmt::Display for StreamEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const CHAT_ANSWER_PREFIX: &str = "chat/answer:";

/// Data-channel traffic of an agent chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentChannelMessage {
    /// Decoded agent reply text
    Answer(String),
    /// The avatar started speaking the last answer
    StreamStarted,
    Other(String),
}

impl AgentChannelMessage {
    pub fn parse(message: &str) -> Self {
        if message.contains(CHAT_ANSWER_PREFIX) {
            let encoded = message.replacen(CHAT_ANSWER_PREFIX, "", 1);
            let decoded = match urlencoding::decode(&encoded) {
                Ok(text) => text.into_owned(),
                Err(e) => {
                    tracing::warn!("Undecodable chat answer, using raw text: {}", e);
                    encoded
                }
            };
            return AgentChannelMessage::Answer(decoded);
        }

        if message.contains("stream/started") {
            return AgentChannelMessage::StreamStarted;
        }

        AgentChannelMessage::Other(message.to_string())
    }
}
