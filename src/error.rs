use thiserror::Error;

use crate::game_mode::{Operation, SessionStatus};

#[derive(Error, Debug)]
pub enum TriviaError {
    /// Rejected user input, surfaced as a field error and never fatal.
    #[error("Validation Error: {0}")]
    Validation(String),

    /// A controller method was called outside of its legal state.
    #[error("Invalid state transition: cannot {operation} while {state}")]
    InvalidStateTransition {
        operation: Operation,
        state: SessionStatus,
    },

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),
}

impl TriviaError {
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, TriviaError::InvalidStateTransition { .. })
    }
}

pub type Result<T> = std::result::Result<T, TriviaError>;
