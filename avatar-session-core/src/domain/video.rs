use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether remote video data is currently flowing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    Streaming,
    Empty,
}

impl VideoStatus {
    pub fn is_playing(&self) -> bool {
        matches!(self, VideoStatus::Streaming)
    }

    pub fn label(&self) -> &'static str {
        match self {
            VideoStatus::Streaming => "streaming",
            VideoStatus::Empty => "empty",
        }
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Detects video activity from periodic inbound byte counters.
///
/// Video counts as playing while the counter grows between samples.
#[derive(Debug, Clone, Default)]
pub struct VideoActivityMonitor {
    last_bytes_received: Option<u64>,
    playing: bool,
}

impl VideoActivityMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a sample; returns the new status when it flipped
    pub fn observe(&mut self, bytes_received: u64) -> Option<VideoStatus> {
        let playing = bytes_received > self.last_bytes_received.unwrap_or(0);
        self.last_bytes_received = Some(bytes_received);

        if playing == self.playing {
            return None;
        }

        self.playing = playing;
        Some(if playing {
            VideoStatus::Streaming
        } else {
            VideoStatus::Empty
        })
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn last_bytes_received(&self) -> Option<u64> {
        self.last_bytes_received
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// How idle and streamed video are composed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerMode {
    /// Two stacked layers cross-faded by opacity; stream hidden until ready
    Dual,
    /// One layer that switches between the idle clip and the stream
    Single,
}

/// Which layer the viewer currently sees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibleLayer {
    Idle,
    Stream,
    Nothing,
}

/// Presentation state of the idle clip and the live stream
#[derive(Debug, Clone, PartialEq)]
pub struct VideoLayers {
    mode: LayerMode,
    idle_asset: String,
    idle_loaded: bool,
    stream_attached: bool,
    stream_opacity: f32,
    stream_muted: bool,
}

impl VideoLayers {
    pub fn new(mode: LayerMode, idle_asset: impl Into<String>) -> Self {
        Self {
            mode,
            idle_asset: idle_asset.into(),
            idle_loaded: false,
            stream_attached: false,
            stream_opacity: 0.0,
            stream_muted: true,
        }
    }

    /// Load the looping idle clip
    pub fn play_idle(&mut self) {
        self.idle_loaded = true;
        if self.mode == LayerMode::Single {
            self.stream_attached = false;
            self.stream_opacity = 0.0;
        }
    }

    /// Apply a video status change. `ready` is the warmup state.
    pub fn on_video_status(&mut self, status: VideoStatus, ready: bool) {
        match (self.mode, status) {
            (LayerMode::Dual, VideoStatus::Streaming) => {
                self.stream_opacity = if ready { 1.0 } else { 0.0 };
                self.stream_attached = true;
                self.stream_muted = !ready;
            }
            (LayerMode::Dual, VideoStatus::Empty) => {
                self.stream_opacity = 0.0;
            }
            (LayerMode::Single, VideoStatus::Streaming) => {
                self.stream_attached = true;
                self.stream_opacity = 1.0;
                self.stream_muted = false;
            }
            (LayerMode::Single, VideoStatus::Empty) => self.play_idle(),
        }
    }

    /// Detach the remote stream (tracks stopped)
    pub fn stop_stream(&mut self) {
        self.stream_attached = false;
        self.stream_opacity = 0.0;
    }

    pub fn stream_opacity(&self) -> f32 {
        self.stream_opacity
    }

    pub fn idle_opacity(&self) -> f32 {
        match self.mode {
            LayerMode::Dual => 1.0 - self.stream_opacity,
            LayerMode::Single => {
                if self.stream_attached {
                    0.0
                } else {
                    1.0
                }
            }
        }
    }

    pub fn is_stream_attached(&self) -> bool {
        self.stream_attached
    }

    pub fn is_stream_muted(&self) -> bool {
        self.stream_muted
    }

    pub fn is_idle_loaded(&self) -> bool {
        self.idle_loaded
    }

    pub fn idle_asset(&self) -> &str {
        &self.idle_asset
    }

    pub fn visible(&self) -> VisibleLayer {
        if self.stream_attached && self.stream_opacity > 0.0 {
            VisibleLayer::Stream
        } else if self.idle_loaded {
            VisibleLayer::Idle
        } else {
            VisibleLayer::Nothing
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_with_bytes_is_playing() {
        let mut monitor = VideoActivityMonitor::new();
        assert_eq!(monitor.observe(1200), Some(VideoStatus::Streaming));
        assert!(monitor.is_playing());
    }

    #[test]
    fn test_zero_bytes_stays_empty() {
        let mut monitor = VideoActivityMonitor::new();
        assert_eq!(monitor.observe(0), None);
        assert!(!monitor.is_playing());
        assert_eq!(monitor.last_bytes_received(), Some(0));
    }

    #[test]
    fn test_emits_only_on_change() {
        let mut monitor = VideoActivityMonitor::new();
        assert_eq!(monitor.observe(100), Some(VideoStatus::Streaming));
        assert_eq!(monitor.observe(200), None);
        assert_eq!(monitor.observe(300), None);
        assert_eq!(monitor.observe(300), Some(VideoStatus::Empty));
        assert_eq!(monitor.observe(300), None);
        assert_eq!(monitor.observe(350), Some(VideoStatus::Streaming));
    }

    #[test]
    fn test_reset_forgets_counter() {
        let mut monitor = VideoActivityMonitor::new();
        monitor.observe(500);
        monitor.reset();
        assert!(monitor.last_bytes_received().is_none());
        assert!(!monitor.is_playing());
    }

    #[test]
    fn test_dual_layers_hide_stream_until_ready() {
        let mut layers = VideoLayers::new(LayerMode::Dual, "emma_idle.mp4");
        layers.play_idle();

        layers.on_video_status(VideoStatus::Streaming, false);
        assert!(layers.is_stream_attached());
        assert!(layers.is_stream_muted());
        assert_eq!(layers.stream_opacity(), 0.0);
        assert_eq!(layers.idle_opacity(), 1.0);
        assert_eq!(layers.visible(), VisibleLayer::Idle);

        layers.on_video_status(VideoStatus::Streaming, true);
        assert!(!layers.is_stream_muted());
        assert_eq!(layers.stream_opacity(), 1.0);
        assert_eq!(layers.idle_opacity(), 0.0);
        assert_eq!(layers.visible(), VisibleLayer::Stream);

        layers.on_video_status(VideoStatus::Empty, true);
        assert_eq!(layers.idle_opacity(), 1.0);
        assert_eq!(layers.visible(), VisibleLayer::Idle);
    }

    #[test]
    fn test_single_layer_swaps_sources() {
        let mut layers = VideoLayers::new(LayerMode::Single, "emma_idle.mp4");
        layers.play_idle();
        assert_eq!(layers.visible(), VisibleLayer::Idle);

        layers.on_video_status(VideoStatus::Streaming, false);
        assert_eq!(layers.visible(), VisibleLayer::Stream);
        assert!(!layers.is_stream_muted());

        layers.on_video_status(VideoStatus::Empty, false);
        assert!(!layers.is_stream_attached());
        assert_eq!(layers.visible(), VisibleLayer::Idle);
    }

    #[test]
    fn test_stop_stream_detaches() {
        let mut layers = VideoLayers::new(LayerMode::Dual, "cewe_idle.mp4");
        layers.on_video_status(VideoStatus::Streaming, true);
        layers.stop_stream();
        assert!(!layers.is_stream_attached());
        assert_eq!(layers.visible(), VisibleLayer::Nothing);
    }
}
