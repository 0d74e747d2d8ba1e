use avatar_session_core::{StreamEvent, VideoLayers, VisibleLayer};
use avatar_session_rtc::{AgentSetup, SessionEvent};

/// One-line rendering of a session event for the terminal
pub fn describe(event: &SessionEvent) -> String {
    match event {
        SessionEvent::Status(update) => {
            let value = if update.value.is_empty() {
                "-"
            } else {
                update.value.as_str()
            };
            format!("📶 {}: {}", update.key.label(), value)
        }
        SessionEvent::Video(status) => format!("🎞️  video {}", status),
        SessionEvent::Layers(layers) => format!("🖼️  {}", describe_layers(layers)),
        SessionEvent::Stream(StreamEvent::Other(raw)) => format!("📨 {}", raw),
        SessionEvent::Stream(event) => format!("📨 stream/{}", event),
        SessionEvent::StreamReady => "✅ stream ready".to_string(),
        SessionEvent::History(entry) => format!("💬 {}", entry),
        SessionEvent::Agent(AgentSetup::Processing) => "⏳ creating agent...".to_string(),
        SessionEvent::Agent(AgentSetup::Ready { agent_id, chat_id }) => {
            format!("🤖 agent {} chat {}", agent_id, chat_id)
        }
        SessionEvent::Agent(AgentSetup::Failed) => "❌ agent setup failed".to_string(),
        SessionEvent::Closed => "🔌 connection closed".to_string(),
    }
}

pub fn describe_layers(layers: &VideoLayers) -> String {
    let visible = match layers.visible() {
        VisibleLayer::Idle => format!("idle ({})", layers.idle_asset()),
        VisibleLayer::Stream if layers.is_stream_muted() => "stream (muted)".to_string(),
        VisibleLayer::Stream => "stream".to_string(),
        VisibleLayer::Nothing => "nothing".to_string(),
    };
    format!(
        "showing {} [stream {:.0}%, idle {:.0}%]",
        visible,
        layers.stream_opacity() * 100.0,
        layers.idle_opacity() * 100.0
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use avatar_session_core::{HistoryEntry, LayerMode, StatusKey, StatusUpdate, VideoStatus};

    #[test]
    fn test_cleared_status_renders_dash() {
        let line = describe(&SessionEvent::Status(StatusUpdate {
            key: StatusKey::Peer,
            value: String::new(),
        }));
        assert!(line.ends_with(": -"));
    }

    #[test]
    fn test_history_line() {
        let line = describe(&SessionEvent::History(HistoryEntry::User("hi".to_string())));
        assert_eq!(line, "💬 User: hi");
    }

    #[test]
    fn test_stream_event_lines() {
        assert_eq!(
            describe(&SessionEvent::Stream(StreamEvent::Started)),
            "📨 stream/started"
        );
        assert_eq!(
            describe(&SessionEvent::Stream(StreamEvent::parse("stream/video/created:{}"))),
            "📨 stream/video/created"
        );
    }

    #[test]
    fn test_layers_description() {
        let mut layers = VideoLayers::new(LayerMode::Dual, "emma_idle.mp4");
        layers.play_idle();
        assert_eq!(
            describe_layers(&layers),
            "showing idle (emma_idle.mp4) [stream 0%, idle 100%]"
        );

        layers.on_video_status(VideoStatus::Streaming, true);
        assert_eq!(
            describe_layers(&layers),
            "showing stream [stream 100%, idle 0%]"
        );
    }
}
