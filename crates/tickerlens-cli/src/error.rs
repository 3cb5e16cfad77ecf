use thiserror::Error;
use tickerlens_core::{AggregateError, HttpError, ValidationError};

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("the following tickers were not found: {}", .0.join(", "))]
    TickersNotFound(Vec<String>),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error("http client setup failed: {0}")]
    Transport(#[from] HttpError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error("input closed before a valid ticker list was entered")]
    InputClosed,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::TickersNotFound(_) => 2,
            Self::Aggregate(AggregateError::Validation(_)) => 2,
            Self::Aggregate(AggregateError::Provider { .. }) => 3,
            Self::Transport(_) => 3,
            Self::Serialization(_) => 4,
            Self::InputClosed => 6,
            Self::Io(_) => 10,
        }
    }
}
