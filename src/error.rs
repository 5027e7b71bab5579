use thiserror::Error;

/// Main error type for the game engine
#[derive(Error, Debug)]
pub enum SetDealError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Actor plumbing errors
    #[error("Channel closed: {0}")]
    ChannelClosed(&'static str),

    #[error("Task join failed: {0}")]
    Join(String),

    // Generic errors
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for SetDealError
pub type Result<T> = std::result::Result<T, SetDealError>;
