//! Game review pipeline
//!
//! Sequence -> evaluate -> classify -> aggregate -> summarize. Only the
//! evaluation step does I/O; everything after it is a pure function of the
//! replayed game and the evaluation outcomes.

use chess_core::{parse_game, GameMetadata, GameRecord, PlyRecord, Position, Side};
use serde::Serialize;
use tracing::{debug, info};

use crate::accuracy::{average_loss, AccuracyModel};
use crate::analysis::{classify_move, Classifications, MoveClass, MoveClassification, Thresholds};
use crate::book_cache::OpeningBook;
use crate::client::{CancelFlag, EvaluationClient, PositionEvaluator, Progress};
use crate::config::ReviewConfig;
use crate::error::ReviewError;
use crate::evaluation::{EvalOutcome, Evaluation, Unscored};
use crate::summary::format_summary;

/// A value per player.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ByColor<T> {
    pub white: T,
    pub black: T,
}

impl<T> ByColor<T> {
    pub fn get(&self, side: Side) -> &T {
        match side {
            Side::White => &self.white,
            Side::Black => &self.black,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::White => &mut self.white,
            Side::Black => &mut self.black,
        }
    }
}

/// One ply with the evaluation of the position it produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewedMove {
    pub ply: PlyRecord,
    pub evaluation: EvalOutcome,
    /// Missing when either neighbouring position is unscored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<MoveClassification>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameEvaluation {
    pub metadata: GameMetadata,
    pub starting_evaluation: EvalOutcome,
    pub moves: Vec<ReviewedMove>,
    pub accuracy: ByColor<f64>,
    pub counts: ByColor<Classifications>,
    pub average_loss: ByColor<f64>,
    pub unscored_positions: usize,
    pub summary_text: String,
}

impl GameEvaluation {
    /// Classified moves of one side, in ply order.
    pub fn classifications(&self, side: Side) -> impl Iterator<Item = &MoveClassification> {
        self.moves
            .iter()
            .filter_map(|m| m.classification.as_ref())
            .filter(move |c| c.moving_side == side)
    }

    /// Evaluation of the position the given ply was played from.
    pub fn evaluation_before(&self, ply_index: usize) -> Option<&Evaluation> {
        if ply_index == 0 {
            self.starting_evaluation.scored()
        } else {
            self.moves
                .get(ply_index - 1)
                .and_then(|m| m.evaluation.scored())
        }
    }
}

pub struct GameReviewer<E> {
    client: EvaluationClient<E>,
    thresholds: Thresholds,
    accuracy: AccuracyModel,
    book: OpeningBook,
    book_max_plies: usize,
    summary_max_errors: usize,
}

impl<E: PositionEvaluator> GameReviewer<E> {
    /// Build a reviewer, loading the opening book the config points at.
    pub fn new(evaluator: E, config: &ReviewConfig) -> Result<Self, ReviewError> {
        let book = OpeningBook::from_config(config.opening_book_path.as_deref())?;
        Ok(Self {
            client: EvaluationClient::new(evaluator, config.client_settings()),
            thresholds: config.thresholds,
            accuracy: config.accuracy_model(),
            book,
            book_max_plies: config.book_max_plies,
            summary_max_errors: config.summary_max_errors,
        })
    }

    pub fn with_book(mut self, book: OpeningBook) -> Self {
        self.book = book;
        self
    }

    /// Review a game record without progress reporting or cancellation.
    pub async fn evaluate_game(&self, movetext: &str) -> Result<GameEvaluation, ReviewError> {
        self.evaluate_game_with(movetext, &CancelFlag::new(), |_| {})
            .await
    }

    /// Review a game record.
    ///
    /// Fails with `InvalidRecord` before any evaluator call when the record
    /// does not replay, with `EvaluationUnavailable` when the evaluator cannot
    /// be reached at all, and with `Cancelled` when `cancel` fires.
    pub async fn evaluate_game_with<F>(
        &self,
        movetext: &str,
        cancel: &CancelFlag,
        progress: F,
    ) -> Result<GameEvaluation, ReviewError>
    where
        F: FnMut(Progress),
    {
        let record = parse_game(movetext)?;
        info!(plies = record.ply_count(), start = %record.start, "Game sequenced");

        let positions: Vec<Position> = record.positions().cloned().collect();
        let outcomes = self
            .client
            .evaluate_positions(&positions, cancel, progress)
            .await?;

        let evaluation = self.assemble(record, outcomes);
        info!(
            white_accuracy = evaluation.accuracy.white,
            black_accuracy = evaluation.accuracy.black,
            unscored = evaluation.unscored_positions,
            "Game reviewed"
        );
        Ok(evaluation)
    }

    /// Classify, aggregate and summarize. `outcomes` holds one entry per
    /// position, starting position first.
    fn assemble(&self, record: GameRecord, outcomes: Vec<EvalOutcome>) -> GameEvaluation {
        let book_plies = self.book.leading_book_plies(&record, self.book_max_plies);
        if book_plies > 0 {
            debug!(book_plies, "Opening book run");
        }

        let unscored_positions = outcomes.iter().filter(|o| !o.is_scored()).count();

        let mut outcomes = outcomes.into_iter();
        let starting_evaluation = outcomes
            .next()
            .unwrap_or(EvalOutcome::Unscored(Unscored::Skipped));

        let mut moves: Vec<ReviewedMove> = Vec::with_capacity(record.plies.len());
        let mut before = starting_evaluation.clone();

        for ply in record.plies {
            let after = outcomes
                .next()
                .unwrap_or(EvalOutcome::Unscored(Unscored::Skipped));

            let classification = match (before.scored(), after.scored()) {
                (Some(prev), Some(next)) => {
                    let mut c = classify_move(ply.index, prev, next, ply.side, &self.thresholds);
                    if ply.index < book_plies {
                        c.class = MoveClass::Book;
                    }
                    Some(c)
                }
                _ => {
                    debug!(ply = ply.index, notation = %ply.notation, "Insufficient data, move unclassified");
                    None
                }
            };

            before = after.clone();
            moves.push(ReviewedMove {
                ply,
                evaluation: after,
                classification,
            });
        }

        let mut by_side: ByColor<Vec<MoveClassification>> = ByColor::default();
        let mut counts: ByColor<Classifications> = ByColor::default();
        for c in moves.iter().filter_map(|m| m.classification.as_ref()) {
            by_side.get_mut(c.moving_side).push(c.clone());
            counts.get_mut(c.moving_side).record(c.class);
        }

        let mut evaluation = GameEvaluation {
            metadata: record.metadata,
            starting_evaluation,
            moves,
            accuracy: ByColor {
                white: self.accuracy.side_accuracy(&by_side.white),
                black: self.accuracy.side_accuracy(&by_side.black),
            },
            counts,
            average_loss: ByColor {
                white: average_loss(&by_side.white),
                black: average_loss(&by_side.black),
            },
            unscored_positions,
            summary_text: String::new(),
        };
        evaluation.summary_text = format_summary(&evaluation, self.summary_max_errors);
        evaluation
    }
}
