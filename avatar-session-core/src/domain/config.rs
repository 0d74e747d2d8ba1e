use crate::domain::{PresenterType, Service};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Placeholder shipped in the sample `api.json`
pub const PLACEHOLDER_KEY: &str = "🤫";

/// Errors raised while loading or validating the API configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Please put your api key inside api.json")]
    PlaceholderKey,

    #[error("Please put your elevenlabs key inside api.json")]
    MissingElevenLabsKey,
}

/// API credentials and endpoints (the `api.json` file)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    /// Basic-auth key for the avatar API
    pub key: String,
    /// REST base URL, e.g. `https://api.d-id.com`
    pub url: String,
    /// WebSocket endpoint for the streaming protocol
    #[serde(default)]
    pub websocket_url: Option<String>,
    /// Which presenter service to drive
    #[serde(default)]
    pub service: Service,
    /// Key for the ElevenLabs TTS provider (audio streaming only)
    #[serde(default)]
    pub elevenlabs_key: Option<String>,
}

impl ApiConfig {
    /// Parse and validate a config from JSON text
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ApiConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        tracing::debug!("Loaded API config from {}", path.display());
        Self::from_json(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.key == PLACEHOLDER_KEY {
            return Err(ConfigError::PlaceholderKey);
        }
        Ok(())
    }

    pub fn presenter_type(&self) -> PresenterType {
        self.service.presenter_type()
    }

    /// REST path segment for stream endpoints (`talks` / `clips`)
    pub fn service_path(&self) -> &'static str {
        self.service.as_str()
    }

    /// REST base URL without trailing slash
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    pub fn require_elevenlabs_key(&self) -> Result<&str, ConfigError> {
        match self.elevenlabs_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(ConfigError::MissingElevenLabsKey),
        }
    }
}
