use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClockError {
    #[error("Aborting after running {0} timers, assuming an infinite loop")]
    LoopLimitExceeded(usize),

    #[error("No tokio runtime available: {0}")]
    NoRuntime(String),
}

pub type ClockResult<T> = std::result::Result<T, ClockError>;
