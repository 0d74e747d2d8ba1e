use serde::{Deserialize, Serialize};
use std::fmt;

/// Presenter service behind the stream endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    #[default]
    Talks,
    Clips,
}

impl Service {
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Talks => "talks",
            Service::Clips => "clips",
        }
    }

    pub fn presenter_type(&self) -> PresenterType {
        match self {
            Service::Talks => PresenterType::Talk,
            Service::Clips => PresenterType::Clip,
        }
    }

    /// Looping clip shown while nothing is streamed
    pub fn idle_video(&self) -> &'static str {
        match self {
            Service::Talks => "emma_idle.mp4",
            Service::Clips => "cewe_idle.mp4",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presenter kind sent alongside every streaming message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenterType {
    Talk,
    Clip,
}

impl fmt::Display for PresenterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresenterType::Talk => write!(f, "talk"),
            PresenterType::Clip => write!(f, "clip"),
        }
    }
}

/// Presenter selection carried by `init-stream`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PresenterInput {
    /// Talks are driven from a still image
    Talk { source_url: String },
    /// Clips use a pre-recorded presenter and driver
    Clip {
        presenter_id: String,
        driver_id: String,
    },
}

impl PresenterInput {
    pub const DEFAULT_TALK_SOURCE: &'static str =
        "https://clips-presenters.d-id.com/v2/amber/Y5K02DLS4m/9o3E6z8MPD/thumbnail.png";
    pub const DEFAULT_CLIP_PRESENTER: &'static str = "v2_public_amber@Y5K02DLS4m";
    pub const DEFAULT_CLIP_DRIVER: &'static str = "9o3E6z8MPD";

    /// Demo presenter for the given service
    pub fn default_for(service: Service) -> Self {
        match service {
            Service::Talks => PresenterInput::Talk {
                source_url: Self::DEFAULT_TALK_SOURCE.to_string(),
            },
            Service::Clips => PresenterInput::Clip {
                presenter_id: Self::DEFAULT_CLIP_PRESENTER.to_string(),
                driver_id: Self::DEFAULT_CLIP_DRIVER.to_string(),
            },
        }
    }
}
