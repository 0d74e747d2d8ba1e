use avatar_session_core::ConfigError;
use avatar_session_rtc::RtcError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session error: {0}")]
    Session(#[from] RtcError),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),
}

pub type Result<T> = std::result::Result<T, CliError>;
