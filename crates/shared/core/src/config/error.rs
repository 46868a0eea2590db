use thiserror::Error;

/// Invalid node configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("countdownFrom must be a whole number >= 1, got {0:?}")]
    InvalidCountdownFrom(String),

    #[error("countdownFrom is missing")]
    MissingCountdownFrom,

    #[error("debounceInMs is not correctly defined!")]
    InvalidDebounce(Option<String>),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
