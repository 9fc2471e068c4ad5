//! Chess game review: evaluates every position of a game through a remote
//! engine, classifies each move by the winning chances it gave away, and
//! aggregates per-side accuracy.

pub mod accuracy;
pub mod analysis;
pub mod analyzer;
pub mod book_cache;
pub mod chess_api;
pub mod client;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod summary;

pub use accuracy::{AccuracyCurve, AccuracyModel, Aggregation};
pub use analysis::{classify_move, Classifications, MoveClass, MoveClassification, Thresholds};
pub use analyzer::{ByColor, GameEvaluation, GameReviewer, ReviewedMove};
pub use book_cache::OpeningBook;
pub use chess_api::ChessApiEvaluator;
pub use client::{CancelFlag, ClientSettings, EvaluationClient, PositionEvaluator, Progress};
pub use config::ReviewConfig;
pub use error::{EvaluatorError, ReviewError};
pub use evaluation::{
    to_mover_perspective, EngineReport, EvalOutcome, EvalRequest, Evaluation, ScorePerspective,
    Unscored,
};
pub use summary::format_summary;
