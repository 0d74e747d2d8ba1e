use crate::infrastructure::{DEFAULT_TTS_MODEL, DEFAULT_TTS_VOICE, ELEVENLABS_URL};
use avatar_session_core::domain::DEFAULT_AUDIO_CHUNK_SIZE;
use avatar_session_core::RetryPolicy;
use std::time::Duration;

/// Microsoft voice used for text scripts
pub const DEFAULT_TEXT_VOICE: &str = "en-US-JennyNeural";

const MIN_STATS_INTERVAL_MS: u64 = 1;

/// Tunables for the streaming and agents clients
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Interval between video activity samples
    pub stats_interval_ms: u64,

    /// Start not ready and wait for `stream/ready`
    pub stream_warmup: bool,

    /// Delay between `stream/ready` and marking the stream ready
    pub ready_delay_ms: u64,

    /// Force readiness this long after the peer connects
    pub ready_fallback_ms: u64,

    /// Maximum wait for the `init-stream` reply
    pub connect_timeout_ms: u64,

    pub audio_chunk_size: usize,

    pub http_retry: RetryPolicy,
    pub poll_retry: RetryPolicy,

    pub text_voice_id: String,
    pub tts_voice_id: String,
    pub tts_model_id: String,
    pub tts_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            stats_interval_ms: 500,
            stream_warmup: true,
            ready_delay_ms: 1000,
            ready_fallback_ms: 5000,
            connect_timeout_ms: 30_000,
            audio_chunk_size: DEFAULT_AUDIO_CHUNK_SIZE,
            http_retry: RetryPolicy::http(),
            poll_retry: RetryPolicy::polling(),
            text_voice_id: DEFAULT_TEXT_VOICE.to_string(),
            tts_voice_id: DEFAULT_TTS_VOICE.to_string(),
            tts_model_id: DEFAULT_TTS_MODEL.to_string(),
            tts_url: ELEVENLABS_URL.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stats_interval(mut self, ms: u64) -> Self {
        self.stats_interval_ms = ms;
        self
    }

    pub fn with_warmup(mut self, warmup: bool) -> Self {
        self.stream_warmup = warmup;
        self
    }

    pub fn with_ready_delay(mut self, ms: u64) -> Self {
        self.ready_delay_ms = ms;
        self
    }

    pub fn with_ready_fallback(mut self, ms: u64) -> Self {
        self.ready_fallback_ms = ms;
        self
    }

    pub fn with_connect_timeout(mut self, ms: u64) -> Self {
        self.connect_timeout_ms = ms;
        self
    }

    pub fn with_audio_chunk_size(mut self, size: usize) -> Self {
        self.audio_chunk_size = size;
        self
    }

    pub fn with_http_retry(mut self, policy: RetryPolicy) -> Self {
        self.http_retry = policy;
        self
    }

    pub fn with_poll_retry(mut self, policy: RetryPolicy) -> Self {
        self.poll_retry = policy;
        self
    }

    pub fn with_text_voice(mut self, voice_id: impl Into<String>) -> Self {
        self.text_voice_id = voice_id.into();
        self
    }

    pub fn with_tts_voice(mut self, voice_id: impl Into<String>) -> Self {
        self.tts_voice_id = voice_id.into();
        self
    }

    /// Never zero; a zero setting samples every millisecond
    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms.max(MIN_STATS_INTERVAL_MS))
    }

    pub fn ready_delay(&self) -> Duration {
        Duration::from_millis(self.ready_delay_ms)
    }

    pub fn ready_fallback(&self) -> Duration {
        Duration::from_millis(self.ready_fallback_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}
