//! Move classification: pure functions only
//! (No Board/Engine/Game dependencies)
//!
//! Loss is measured in win-probability points from the mover's perspective:
//! `before - after`, positive when the move made things worse.

use std::fmt;

use chess_core::Side;
use serde::{Deserialize, Serialize};

use crate::evaluation::Evaluation;

/// Quality label of a single move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveClass {
    Brilliant,
    Excellent,
    Good,
    Book,
    Inaccuracy,
    Mistake,
    Blunder,
}

impl MoveClass {
    pub fn label(self) -> &'static str {
        match self {
            MoveClass::Brilliant => "brilliant",
            MoveClass::Excellent => "excellent",
            MoveClass::Good => "good",
            MoveClass::Book => "book",
            MoveClass::Inaccuracy => "inaccuracy",
            MoveClass::Mistake => "mistake",
            MoveClass::Blunder => "blunder",
        }
    }

    /// Inaccuracy or worse.
    pub fn is_error(self) -> bool {
        matches!(
            self,
            MoveClass::Inaccuracy | MoveClass::Mistake | MoveClass::Blunder
        )
    }
}

impl fmt::Display for MoveClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classification thresholds (win-probability points lost by the mover)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub blunder: f64,
    pub mistake: f64,
    pub inaccuracy: f64,
    /// Loss at or below this (a gain) is brilliant
    pub brilliant: f64,
    /// Loss at or below this is excellent
    pub excellent: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            blunder: 20.0,
            mistake: 10.0,
            inaccuracy: 5.0,
            brilliant: -5.0,
            excellent: -1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveClassification {
    pub ply_index: usize,
    pub moving_side: Side,
    pub class: MoveClass,
    /// Win-probability points lost; negative when the move gained
    pub loss_magnitude: f64,
}

impl MoveClassification {
    /// Loss clamped to the displayable range.
    pub fn display_loss(&self) -> f64 {
        self.loss_magnitude.clamp(-100.0, 100.0)
    }
}

/// Winning chances `side` gave away between two consecutive evaluations.
pub fn calculate_loss(before: &Evaluation, after: &Evaluation, side: Side) -> f64 {
    before.win_probability_for(side) - after.win_probability_for(side)
}

pub fn classify_loss(loss: f64, thresholds: &Thresholds) -> MoveClass {
    if loss >= thresholds.blunder {
        MoveClass::Blunder
    } else if loss >= thresholds.mistake {
        MoveClass::Mistake
    } else if loss >= thresholds.inaccuracy {
        MoveClass::Inaccuracy
    } else if loss <= thresholds.brilliant {
        MoveClass::Brilliant
    } else if loss <= thresholds.excellent {
        MoveClass::Excellent
    } else {
        MoveClass::Good
    }
}

/// Classify the ply that led from `before` to `after`.
pub fn classify_move(
    ply_index: usize,
    before: &Evaluation,
    after: &Evaluation,
    side: Side,
    thresholds: &Thresholds,
) -> MoveClassification {
    let loss = calculate_loss(before, after, side);
    MoveClassification {
        ply_index,
        moving_side: side,
        class: classify_loss(loss, thresholds),
        loss_magnitude: loss,
    }
}

/// Per-class move counts for one side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classifications {
    pub brilliant: u32,
    pub excellent: u32,
    pub good: u32,
    pub book: u32,
    pub inaccuracy: u32,
    pub mistake: u32,
    pub blunder: u32,
}

impl Classifications {
    pub fn record(&mut self, class: MoveClass) {
        match class {
            MoveClass::Brilliant => self.brilliant += 1,
            MoveClass::Excellent => self.excellent += 1,
            MoveClass::Good => self.good += 1,
            MoveClass::Book => self.book += 1,
            MoveClass::Inaccuracy => self.inaccuracy += 1,
            MoveClass::Mistake => self.mistake += 1,
            MoveClass::Blunder => self.blunder += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.brilliant
            + self.excellent
            + self.good
            + self.book
            + self.inaccuracy
            + self.mistake
            + self.blunder
    }
}
