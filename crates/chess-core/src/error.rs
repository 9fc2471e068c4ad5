//! Game record errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("Failed to read game record: {0}")]
    Unreadable(String),

    #[error("Invalid starting position: {0}")]
    BadStartPosition(String),

    #[error("Illegal move {san} at ply {ply}: {reason}")]
    IllegalMove {
        ply: usize,
        san: String,
        reason: String,
    },

    #[error("Game record contains no moves")]
    NoMoves,
}
