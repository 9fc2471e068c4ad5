//! Integration tests: run the full review pipeline (sequence, evaluate,
//! classify, aggregate, summarize) against scripted evaluators.

mod common;

use chess_core::{parse_game, RecordError, Side};
use common::*;
use game_review::{
    CancelFlag, EvalOutcome, GameReviewer, MoveClass, ReviewConfig, ReviewError,
    ScorePerspective, Unscored,
};

// ---------------------------------------------------------------------------
// Sequencing and evaluation slots
// ---------------------------------------------------------------------------

#[tokio::test]
async fn requests_one_evaluation_per_position() {
    let evaluator = scripted(vec![0.2, 0.3, 0.25, 0.3, 0.2, 0.4, 0.3, 0.35, 0.3, 0.3]);
    let reviewer = GameReviewer::new(&evaluator, &instant_config()).unwrap();

    let result = reviewer.evaluate_game(RUY_LOPEZ).await.unwrap();
    let record = parse_game(RUY_LOPEZ).unwrap();

    assert_eq!(evaluator.calls(), record.ply_count() + 1);
    let expected: Vec<String> = record.positions().map(|p| p.fen().to_string()).collect();
    assert_eq!(evaluator.fens(), expected);

    assert_eq!(result.moves.len(), 9);
    assert!(result.starting_evaluation.is_scored());
    assert!(result.moves.iter().all(|m| m.classification.is_some()));
    assert_eq!(result.unscored_positions, 0);
}

#[tokio::test]
async fn progress_covers_every_position() {
    let evaluator = scripted(vec![0.2, 0.3, 0.25, 0.3, 0.2]);
    let reviewer = GameReviewer::new(&evaluator, &instant_config()).unwrap();
    let mut seen = Vec::new();

    reviewer
        .evaluate_game_with("1. e4 e5 2. Nf3 Nc6", &CancelFlag::new(), |p| {
            seen.push((p.current, p.total))
        })
        .await
        .unwrap();

    assert_eq!(seen, vec![(1, 5), (2, 5), (3, 5), (4, 5), (5, 5)]);
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn one_move_pair_scores_both_sides_high() {
    let evaluator = scripted(vec![0.0, 0.3, 0.2]);
    let reviewer = GameReviewer::new(&evaluator, &instant_config()).unwrap();

    let result = reviewer.evaluate_game("1. e4 e5").await.unwrap();

    let white = result.moves[0].classification.as_ref().unwrap();
    let black = result.moves[1].classification.as_ref().unwrap();

    assert_eq!(white.moving_side, Side::White);
    assert!(white.loss_magnitude < 0.0);
    assert!(matches!(white.class, MoveClass::Good | MoveClass::Excellent));

    // 0.3 -> 0.2 moves the needle back towards Black
    assert_eq!(black.moving_side, Side::Black);
    assert!(black.loss_magnitude.abs() < 1.0);
    assert_eq!(black.class, MoveClass::Good);

    assert!(result.accuracy.white >= 99.9);
    assert!(result.accuracy.black >= 95.0);
    assert!(result.accuracy.black <= 100.0);
}

#[tokio::test]
async fn failure_in_the_middle_skips_only_touching_plies() {
    // Position 5 of 10 (index 4) is rejected
    let evaluator = StubEvaluator::new(|i, _| {
        if i == 4 {
            rejected()
        } else {
            pawns(0.2 + i as f64 * 0.01)
        }
    });
    let reviewer = GameReviewer::new(&evaluator, &instant_config()).unwrap();

    let result = reviewer.evaluate_game(RUY_LOPEZ).await.unwrap();

    assert_eq!(evaluator.calls(), 10);
    let classified: Vec<usize> = result
        .moves
        .iter()
        .filter_map(|m| m.classification.as_ref().map(|c| c.ply_index))
        .collect();
    assert_eq!(classified, vec![0, 1, 2, 5, 6, 7, 8]);
    assert!(matches!(
        result.moves[3].evaluation,
        EvalOutcome::Unscored(Unscored::Rejected(_))
    ));
    assert_eq!(result.unscored_positions, 1);
    assert!(result.summary_text.contains("Unscored positions: 1"));
}

#[tokio::test]
async fn exhausted_overload_degrades_one_position() {
    let config = ReviewConfig {
        max_retries: 2,
        ..instant_config()
    };
    // Calls: 0 scored, 1..=3 overloaded (position 1 gives up), then the rest
    let evaluator = StubEvaluator::new(|i, _| if (1..=3).contains(&i) { overloaded() } else { pawns(0.1) });
    let reviewer = GameReviewer::new(&evaluator, &config).unwrap();

    let result = reviewer.evaluate_game("1. d4 d5 2. c4").await.unwrap();

    assert_eq!(evaluator.calls(), 6);
    assert_eq!(
        result.moves[0].evaluation,
        EvalOutcome::Unscored(Unscored::Overloaded { attempts: 3 })
    );
    assert!(result.moves[0].classification.is_none());
    assert!(result.moves[1].classification.is_none());
    assert!(result.moves[2].classification.is_some());
}

#[tokio::test]
async fn hard_failure_abandons_rest_of_batch_only() {
    let config = ReviewConfig {
        batch_size: 4,
        ..instant_config()
    };
    // Batches [0..4) [4..6); position 1 fails hard
    let evaluator = StubEvaluator::new(|i, _| if i == 1 { transport() } else { pawns(0.3) });
    let reviewer = GameReviewer::new(&evaluator, &config).unwrap();

    let result = reviewer.evaluate_game("1. e4 e5 2. Nf3 Nc6 3. Bb5").await.unwrap();

    // Positions 2 and 3 were never sent
    assert_eq!(evaluator.calls(), 4);
    assert!(matches!(
        result.moves[0].evaluation,
        EvalOutcome::Unscored(Unscored::Transport(_))
    ));
    assert_eq!(result.moves[1].evaluation, EvalOutcome::Unscored(Unscored::Skipped));
    assert_eq!(result.moves[2].evaluation, EvalOutcome::Unscored(Unscored::Skipped));
    assert!(result.moves[3].evaluation.is_scored());
    assert!(result.moves[4].classification.is_some());
    assert_eq!(result.unscored_positions, 3);
}

// ---------------------------------------------------------------------------
// Failures surfaced to the caller
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unreachable_evaluator_is_unavailable() {
    let evaluator = StubEvaluator::new(|_, _| transport());
    let reviewer = GameReviewer::new(&evaluator, &instant_config()).unwrap();

    let err = reviewer.evaluate_game("1. e4 e5").await.unwrap_err();

    assert!(matches!(err, ReviewError::EvaluationUnavailable(_)));
    assert_eq!(evaluator.calls(), 1);
}

#[tokio::test]
async fn invalid_record_never_reaches_the_evaluator() {
    let evaluator = scripted(vec![0.0; 10]);
    let reviewer = GameReviewer::new(&evaluator, &instant_config()).unwrap();

    let err = reviewer.evaluate_game("1. e4 e5 2. Ke3").await.unwrap_err();
    assert!(matches!(
        err,
        ReviewError::InvalidRecord(RecordError::IllegalMove { ply: 2, .. })
    ));

    let err = reviewer.evaluate_game("").await.unwrap_err();
    assert!(matches!(err, ReviewError::InvalidRecord(RecordError::NoMoves)));

    assert_eq!(evaluator.calls(), 0);
}

#[tokio::test]
async fn cancellation_discards_partial_results() {
    let evaluator = scripted(vec![0.1; 10]);
    let reviewer = GameReviewer::new(&evaluator, &instant_config()).unwrap();
    let cancel = CancelFlag::new();
    let trigger = cancel.clone();

    let err = reviewer
        .evaluate_game_with(RUY_LOPEZ, &cancel, |p| {
            if p.current == 2 {
                trigger.cancel();
            }
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ReviewError::Cancelled));
    assert_eq!(evaluator.calls(), 2);
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[tokio::test]
async fn review_is_idempotent() {
    let scores = vec![0.2, 0.5, -0.4, 1.8, -2.5, -2.4, 3.0, 0.1, 0.1, -6.0];
    let config = instant_config();

    let first = GameReviewer::new(scripted(scores.clone()), &config)
        .unwrap()
        .evaluate_game(RUY_LOPEZ)
        .await
        .unwrap();
    let second = GameReviewer::new(scripted(scores), &config)
        .unwrap()
        .evaluate_game(RUY_LOPEZ)
        .await
        .unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn accuracy_stays_in_range_for_wild_swings() {
    // Mate for White, mate for Black, back and forth
    let evaluator = StubEvaluator::new(|i, _| match i % 3 {
        0 => mate(1),
        1 => mate(-1),
        _ => pawns(-150.0),
    });
    let reviewer = GameReviewer::new(&evaluator, &instant_config()).unwrap();

    let result = reviewer.evaluate_game(RUY_LOPEZ).await.unwrap();

    for side in [Side::White, Side::Black] {
        let acc = *result.accuracy.get(side);
        assert!((0.0..=100.0).contains(&acc), "{side} accuracy {acc}");
    }
    assert!(result.counts.white.blunder + result.counts.black.blunder > 0);
}

#[tokio::test]
async fn side_without_moves_is_perfect() {
    let evaluator = scripted(vec![0.2, -3.0]);
    let reviewer = GameReviewer::new(&evaluator, &instant_config()).unwrap();

    let result = reviewer.evaluate_game("1. f3").await.unwrap();

    assert_eq!(result.classifications(Side::Black).count(), 0);
    assert_eq!(result.accuracy.black, 100.0);
    assert_eq!(result.counts.black.total(), 0);
    assert!(result.accuracy.white < 50.0);
    assert!(result.summary_text.contains("Black: N/A"));
}

#[tokio::test]
async fn side_to_move_reports_match_white_reports() {
    let record = parse_game(RUY_LOPEZ).unwrap();
    let white_scores = vec![0.2, 0.5, -0.4, 1.8, -2.5, -2.4, 3.0, 0.1, 0.1, -6.0];

    // Same numbers, but flipped whenever Black is to move
    let stm_scores: Vec<f64> = record
        .positions()
        .zip(&white_scores)
        .map(|(pos, s)| match pos.side_to_move() {
            Side::White => *s,
            Side::Black => -*s,
        })
        .collect();

    let white = GameReviewer::new(scripted(white_scores), &instant_config())
        .unwrap()
        .evaluate_game(RUY_LOPEZ)
        .await
        .unwrap();

    let stm_config = ReviewConfig {
        perspective: ScorePerspective::SideToMove,
        ..instant_config()
    };
    let stm = GameReviewer::new(scripted(stm_scores), &stm_config)
        .unwrap()
        .evaluate_game(RUY_LOPEZ)
        .await
        .unwrap();

    assert_eq!(white.accuracy, stm.accuracy);
    assert_eq!(white.counts, stm.counts);
}

#[tokio::test]
async fn good_moves_stay_inside_the_good_band() {
    let scores = vec![0.2, 0.5, -0.4, 1.8, -2.5, -2.4, 3.0, 0.1, 0.1, -6.0];
    let reviewer = GameReviewer::new(scripted(scores), &instant_config()).unwrap();

    let result = reviewer.evaluate_game(RUY_LOPEZ).await.unwrap();

    for c in result.moves.iter().filter_map(|m| m.classification.as_ref()) {
        if c.class == MoveClass::Good {
            assert!(c.loss_magnitude > -1.0 && c.loss_magnitude <= 5.0);
        }
    }
}

// ---------------------------------------------------------------------------
// Opening book
// ---------------------------------------------------------------------------

#[tokio::test]
async fn opening_theory_is_labelled_book() {
    let config = ReviewConfig {
        book_max_plies: 20,
        ..instant_config()
    };
    // Swings that would otherwise read as blunders
    let evaluator = scripted(vec![0.2, 2.0, -1.0, 1.5, 0.3, 0.3, 0.2]);
    let reviewer = GameReviewer::new(&evaluator, &config).unwrap();

    let result = reviewer.evaluate_game("1. e4 e5 2. Nf3 Nc6 3. Bb5 a6").await.unwrap();

    assert!(result
        .moves
        .iter()
        .all(|m| m.classification.as_ref().map(|c| c.class) == Some(MoveClass::Book)));
    assert_eq!(result.counts.white.book, 3);
    assert_eq!(result.counts.black.book, 3);
    assert_eq!(result.accuracy.white, 100.0);
    assert_eq!(result.accuracy.black, 100.0);
}
