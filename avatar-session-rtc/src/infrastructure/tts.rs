use crate::infrastructure::error::{Result, RtcError};
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Serialize;

pub const ELEVENLABS_URL: &str = "https://api.elevenlabs.io";
pub const DEFAULT_TTS_VOICE: &str = "iWydkXKoiVtvdn4vLKp9";
pub const DEFAULT_TTS_MODEL: &str = "eleven_turbo_v2_5";

/// Raw 16 kHz PCM, the format the avatar audio script expects
const OUTPUT_FORMAT: &str = "pcm_16000";

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

/// Streaming text-to-speech client for ElevenLabs
#[derive(Clone)]
pub struct ElevenLabs {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model_id: String,
}

impl ElevenLabs {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: ELEVENLABS_URL.to_string(),
            api_key: api_key.into(),
            model_id: DEFAULT_TTS_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn stream_url(&self, voice_id: &str) -> String {
        format!(
            "{}/v1/text-to-speech/{}/stream?output_format={}",
            self.base_url, voice_id, OUTPUT_FORMAT
        )
    }

    /// Synthesize `text` and yield PCM bytes as they arrive
    pub async fn stream_pcm(
        &self,
        text: &str,
        voice_id: &str,
    ) -> Result<BoxStream<'static, Result<Bytes>>> {
        tracing::info!("Requesting TTS for {} chars with voice {}", text.len(), voice_id);

        let response = self
            .client
            .post(self.stream_url(voice_id))
            .header("xi-api-key", &self.api_key)
            .json(&SpeechRequest {
                text,
                model_id: &self.model_id,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let url = response.url().to_string();
            let body = response.text().await.unwrap_or_default();
            return Err(RtcError::HttpStatus {
                status: status.as_u16(),
                url,
                body,
            });
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(RtcError::from))
            .boxed())
    }
}
