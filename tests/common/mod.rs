//! Shared helpers for pipeline tests: scripted evaluators and a config with
//! every delay set to zero.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use game_review::{EngineReport, EvalRequest, EvaluatorError, PositionEvaluator, ReviewConfig};

pub type Reply = Result<EngineReport, EvaluatorError>;

/// Answers each call with `respond(call_index, request)` and records the
/// FEN of every request.
pub struct StubEvaluator<F> {
    respond: F,
    calls: AtomicUsize,
    fens: Mutex<Vec<String>>,
}

impl<F> StubEvaluator<F>
where
    F: Fn(usize, &EvalRequest) -> Reply + Sync,
{
    pub fn new(respond: F) -> Self {
        Self {
            respond,
            calls: AtomicUsize::new(0),
            fens: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fens(&self) -> Vec<String> {
        self.fens.lock().unwrap().clone()
    }
}

impl<F> PositionEvaluator for StubEvaluator<F>
where
    F: Fn(usize, &EvalRequest) -> Reply + Sync,
{
    async fn evaluate(&self, request: &EvalRequest) -> Reply {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        self.fens.lock().unwrap().push(request.fen.clone());
        (self.respond)(index, request)
    }
}

/// Evaluator that plays back `scores` (pawns, White positive) in call order.
pub fn scripted(scores: Vec<f64>) -> StubEvaluator<impl Fn(usize, &EvalRequest) -> Reply + Sync> {
    StubEvaluator::new(move |i, _| match scores.get(i) {
        Some(score) => pawns(*score),
        None => Err(EvaluatorError::Transport("script exhausted".into())),
    })
}

pub fn pawns(score: f64) -> Reply {
    Ok(EngineReport {
        score_pawns: Some(score),
        depth: 12,
        ..Default::default()
    })
}

pub fn mate(moves: i32) -> Reply {
    Ok(EngineReport {
        mate: Some(moves),
        depth: 12,
        ..Default::default()
    })
}

pub fn rejected() -> Reply {
    Err(EvaluatorError::Rejected {
        code: "INVALID_FEN".into(),
        message: "position rejected".into(),
    })
}

pub fn overloaded() -> Reply {
    Err(EvaluatorError::Overloaded("HIGH_USAGE".into()))
}

pub fn transport() -> Reply {
    Err(EvaluatorError::Transport("HTTP 502 Bad Gateway".into()))
}

/// Default config with no waiting and no opening book run.
pub fn instant_config() -> ReviewConfig {
    ReviewConfig {
        throttle_ms: 0,
        batch_pause_ms: 0,
        backoff_ms: 0,
        book_max_plies: 0,
        ..Default::default()
    }
}

/// Nine plies, ten positions.
pub const RUY_LOPEZ: &str = "1. e4 e5 2. Nf3 Nc6 3. Bb5 a6 4. Ba4 Nf6 5. O-O";
