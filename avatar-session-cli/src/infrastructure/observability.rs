use crate::infrastructure::error::{CliError, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub default_level: tracing::Level,
    pub json_format: bool,
    pub show_thread_ids: bool,
    pub show_targets: bool,

    #[cfg(feature = "console")]
    pub enable_console: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: tracing::Level::INFO,
            json_format: false,
            show_thread_ids: false,
            show_targets: true,
            #[cfg(feature = "console")]
            enable_console: false,
        }
    }
}

impl LogConfig {
    /// Development configuration (verbose, human-readable)
    pub fn dev() -> Self {
        Self {
            default_level: tracing::Level::DEBUG,
            show_thread_ids: true,
            ..Default::default()
        }
    }

    /// Machine-readable output, one JSON object per line
    pub fn json() -> Self {
        Self {
            json_format: true,
            ..Default::default()
        }
    }

    /// Pick the preset for the `--verbose` and `--json` flags
    pub fn from_flags(verbose: bool, json: bool) -> Self {
        match (verbose, json) {
            (true, json) => Self::dev().with_json(json),
            (false, true) => Self::json(),
            (false, false) => Self::default(),
        }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json_format = json;
        self
    }

    /// Enable tokio console
    #[cfg(feature = "console")]
    pub fn with_console(mut self) -> Self {
        self.enable_console = true;
        self
    }

    /// Filter used when `RUST_LOG` is not set
    pub fn default_directives(&self) -> String {
        let level = self.default_level.to_string().to_lowercase();
        format!(
            "{}={level},avatar_session_core={level},avatar_session_rtc={level},webrtc=warn,webrtc_ice=warn",
            env!("CARGO_PKG_NAME").replace('-', "_"),
        )
    }

    pub fn init(self) -> Result<()> {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(self.default_directives()))
            .map_err(|e| CliError::Logging(e.to_string()))?;

        #[cfg(feature = "console")]
        if self.enable_console {
            use console_subscriber::ConsoleLayer;

            eprintln!("🔍 Tokio Console enabled - connect with `tokio-console`");
            let console_layer = ConsoleLayer::builder()
                .server_addr(([127, 0, 0, 1], 6669))
                .spawn();

            return tracing_subscriber::registry()
                .with(env_filter)
                .with(console_layer)
                .try_init()
                .map_err(|e| CliError::Logging(e.to_string()));
        }

        let registry = tracing_subscriber::registry().with(env_filter);

        let result = if self.json_format {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(self.show_targets)
                        .with_thread_ids(self.show_thread_ids),
                )
                .try_init()
        } else {
            registry
                .with(
                    fmt::layer()
                        .with_target(self.show_targets)
                        .with_thread_ids(self.show_thread_ids),
                )
                .try_init()
        };

        result.map_err(|e| CliError::Logging(e.to_string()))
    }
}
