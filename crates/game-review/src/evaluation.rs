//! Position evaluations, normalised to White's point of view.
//!
//! Evaluators report either from White's side or from the side to move.
//! Everything downstream of [`normalize_report`] sees centipawns and win
//! probabilities where positive / high favours White; the only place a value
//! crosses to a player's perspective is [`to_mover_perspective`] (win
//! probability) and [`orient_score`] (centipawns).

use std::str::FromStr;

use chess_core::Side;
use serde::{Deserialize, Serialize};

/// Centipawn value of a mate in zero; mate in N scores `MATE_SCORE - 10 * N`.
pub const MATE_SCORE: i32 = 10000;

/// Logistic slope of the centipawn → win-probability curve.
const WIN_PROBABILITY_SLOPE: f64 = 0.00368208;

/// Centipawn magnitude beyond which win probability stops moving.
const MAX_CP_FOR_WIN_PROBABILITY: i32 = 1000;

/// A scored position. `score` and `win_probability` always favour White when
/// positive / above 50.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Centipawns, positive favours White
    pub score: i32,
    /// Chance White wins, 0-100
    pub win_probability: f64,
    /// Engine's preferred move in the position, SAN when available
    pub best_reply: Option<String>,
    pub search_depth: u32,
    /// Mate distance in moves, positive when White mates
    pub mate_distance: Option<i32>,
}

impl Evaluation {
    /// Build an evaluation from a White-relative centipawn score.
    pub fn from_score(score: i32) -> Self {
        Self {
            score,
            win_probability: win_probability_from_cp(score),
            best_reply: None,
            search_depth: 0,
            mate_distance: None,
        }
    }

    /// Win probability as seen by `side`.
    pub fn win_probability_for(&self, side: Side) -> f64 {
        to_mover_perspective(self.win_probability, side)
    }

    /// The same evaluation with colours swapped.
    pub fn mirrored(&self) -> Self {
        Self {
            score: orient_score(self.score, Side::Black),
            win_probability: to_mover_perspective(self.win_probability, Side::Black),
            best_reply: self.best_reply.clone(),
            search_depth: self.search_depth,
            mate_distance: self.mate_distance.map(|m| orient_score(m, Side::Black)),
        }
    }
}

/// Convert a White win probability to `side`'s winning chances.
/// The mapping is its own inverse, so it also converts back.
pub fn to_mover_perspective(white_win_probability: f64, side: Side) -> f64 {
    match side {
        Side::White => white_win_probability,
        Side::Black => 100.0 - white_win_probability,
    }
}

/// Convert a White-relative centipawn (or mate) value to `side`'s view.
pub fn orient_score(value: i32, side: Side) -> i32 {
    match side {
        Side::White => value,
        Side::Black => -value,
    }
}

/// White win probability for a White-relative centipawn score.
pub fn win_probability_from_cp(cp: i32) -> f64 {
    let cp = cp.clamp(-MAX_CP_FOR_WIN_PROBABILITY, MAX_CP_FOR_WIN_PROBABILITY) as f64;
    50.0 + 50.0 * (2.0 / (1.0 + (-WIN_PROBABILITY_SLOPE * cp).exp()) - 1.0)
}

/// Centipawn stand-in for a White-relative mate distance.
pub fn mate_to_centipawns(mate: i32) -> i32 {
    if mate > 0 {
        MATE_SCORE - mate * 10
    } else {
        -MATE_SCORE - mate * 10
    }
}

/// How the evaluator orients its numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorePerspective {
    /// Positive always favours White
    #[default]
    White,
    /// Positive favours whoever is to move in the evaluated position
    SideToMove,
}

impl FromStr for ScorePerspective {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" => Ok(Self::White),
            "side_to_move" | "side-to-move" | "stm" => Ok(Self::SideToMove),
            other => Err(format!("unknown score perspective: {other}")),
        }
    }
}

/// What gets sent to the evaluator for one position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalRequest {
    pub fen: String,
    pub depth: u32,
    pub max_thinking_time_ms: u64,
}

/// Raw answer from the evaluator, still in its own perspective.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineReport {
    /// Score in pawns
    pub score_pawns: Option<f64>,
    /// Win chance 0-100
    pub win_chance: Option<f64>,
    pub mate: Option<i32>,
    pub best_move_uci: Option<String>,
    pub best_move_san: Option<String>,
    pub depth: u32,
}

/// Turn an evaluator report into a White-relative [`Evaluation`].
///
/// `side_to_move` is the side to move in the evaluated position; it only
/// matters for [`ScorePerspective::SideToMove`].
pub fn normalize_report(
    report: &EngineReport,
    side_to_move: Side,
    perspective: ScorePerspective,
) -> Result<Evaluation, String> {
    let reported_for = match perspective {
        ScorePerspective::White => Side::White,
        ScorePerspective::SideToMove => side_to_move,
    };

    let mate_distance = report
        .mate
        .filter(|m| *m != 0)
        .map(|m| orient_score(m, reported_for));

    let score = match (mate_distance, report.score_pawns) {
        (Some(mate), _) => mate_to_centipawns(mate),
        (None, Some(pawns)) if pawns.is_finite() => {
            orient_score((pawns * 100.0).round() as i32, reported_for)
        }
        _ => return Err("evaluator response carries no score".to_string()),
    };

    let win_probability = match (mate_distance, report.win_chance) {
        (_, Some(chance)) if chance.is_finite() => {
            to_mover_perspective(chance.clamp(0.0, 100.0), reported_for)
        }
        (Some(mate), _) if mate > 0 => 100.0,
        (Some(_), _) => 0.0,
        (None, _) => win_probability_from_cp(score),
    };

    Ok(Evaluation {
        score,
        win_probability,
        best_reply: report
            .best_move_san
            .clone()
            .or_else(|| report.best_move_uci.clone()),
        search_depth: report.depth,
        mate_distance,
    })
}

/// Why a position has no evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "message", rename_all = "snake_case")]
pub enum Unscored {
    /// Still overloaded after every retry
    Overloaded { attempts: u32 },
    /// The evaluator refused this position
    Rejected(String),
    /// Transport failure on this position
    Transport(String),
    /// Not attempted because an earlier call in the batch failed hard
    Skipped,
}

/// Per-position evaluation slot. A missing evaluation is never a zero score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum EvalOutcome {
    Scored(Evaluation),
    Unscored(Unscored),
}

impl EvalOutcome {
    pub fn scored(&self) -> Option<&Evaluation> {
        match self {
            EvalOutcome::Scored(eval) => Some(eval),
            EvalOutcome::Unscored(_) => None,
        }
    }

    pub fn is_scored(&self) -> bool {
        self.scored().is_some()
    }
}
