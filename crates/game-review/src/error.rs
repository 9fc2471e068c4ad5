//! Review error types

use chess_core::RecordError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Invalid game record: {0}")]
    InvalidRecord(#[from] RecordError),

    #[error("Evaluation unavailable: {0}")]
    EvaluationUnavailable(String),

    #[error("Analysis cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Opening book error: {0}")]
    Book(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Failure of a single evaluator call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluatorError {
    /// The service is at capacity; safe to retry after a pause.
    #[error("Evaluator overloaded: {0}")]
    Overloaded(String),

    /// The service answered with an error payload for this position.
    #[error("Evaluator rejected position ({code}): {message}")]
    Rejected { code: String, message: String },

    /// Network error, timeout or unexpected HTTP status.
    #[error("Evaluator transport failure: {0}")]
    Transport(String),
}
