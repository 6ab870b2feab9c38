//! Application error types.

use hedge_position::PositionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Event line that is not a valid event.
    #[error("Line {line}: malformed event: {message}")]
    Parse { line: usize, message: String },

    /// Event rejected by position accounting. Replay stops here.
    #[error("Line {line}: {source}")]
    Event {
        line: usize,
        #[source]
        source: PositionError,
    },

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
