//! Per-side accuracy: a decay curve from win-probability loss to a 0-100 move
//! score, followed by a mean that punishes low outliers.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::analysis::{MoveClass, MoveClassification};

/// Saturating decay `clamp(a * exp(-k * loss) + b, 0, 100)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccuracyCurve {
    /// Losses at or below this score a full 100
    pub tolerance: f64,
    pub a: f64,
    pub b: f64,
    pub k: f64,
}

impl Default for AccuracyCurve {
    fn default() -> Self {
        Self {
            tolerance: 0.5,
            a: 110.0,
            b: -10.0,
            k: 0.08,
        }
    }
}

impl AccuracyCurve {
    pub fn move_accuracy(&self, loss: f64) -> f64 {
        if loss.is_nan() {
            return 0.0;
        }
        if loss <= self.tolerance {
            return 100.0;
        }
        (self.a * (-self.k * loss).exp() + self.b).clamp(0.0, 100.0)
    }
}

/// How per-move scores combine into one number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Harmonic mean with every move floored at [`HARMONIC_FLOOR`]
    #[default]
    Harmonic,
    /// `100 - sqrt(mean((100 - s)^2))`
    Quadratic,
}

/// Lowest per-move score the harmonic mean sees.
pub const HARMONIC_FLOOR: f64 = 10.0;

impl FromStr for Aggregation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "harmonic" => Ok(Self::Harmonic),
            "quadratic" | "rms" => Ok(Self::Quadratic),
            other => Err(format!("unknown accuracy aggregation: {other}")),
        }
    }
}

impl Aggregation {
    /// Combine per-move scores. Empty input is 100.
    pub fn combine(self, scores: &[f64]) -> f64 {
        if scores.is_empty() {
            return 100.0;
        }
        let n = scores.len() as f64;

        let value = match self {
            Aggregation::Harmonic => {
                let inverse_sum: f64 = scores
                    .iter()
                    .map(|s| 1.0 / s.clamp(HARMONIC_FLOOR, 100.0))
                    .sum();
                n / inverse_sum
            }
            Aggregation::Quadratic => {
                let mean_sq: f64 = scores
                    .iter()
                    .map(|s| {
                        let gap = 100.0 - s.clamp(0.0, 100.0);
                        gap * gap
                    })
                    .sum::<f64>()
                    / n;
                100.0 - mean_sq.sqrt()
            }
        };

        if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 100.0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AccuracyModel {
    pub curve: AccuracyCurve,
    pub aggregation: Aggregation,
}

impl AccuracyModel {
    pub fn new(aggregation: Aggregation) -> Self {
        Self {
            curve: AccuracyCurve::default(),
            aggregation,
        }
    }

    /// Score of a single classified move. Book moves are perfect.
    pub fn move_accuracy(&self, classification: &MoveClassification) -> f64 {
        match classification.class {
            MoveClass::Book => 100.0,
            _ => self.curve.move_accuracy(classification.loss_magnitude),
        }
    }

    /// Accuracy of one side from its classified moves. No moves means 100.
    pub fn side_accuracy(&self, moves: &[MoveClassification]) -> f64 {
        let scores: Vec<f64> = moves.iter().map(|m| self.move_accuracy(m)).collect();
        self.aggregation.combine(&scores)
    }
}

/// Mean loss over non-book moves, gains counted as zero.
pub fn average_loss(moves: &[MoveClassification]) -> f64 {
    let losses: Vec<f64> = moves
        .iter()
        .filter(|m| m.class != MoveClass::Book && !m.loss_magnitude.is_nan())
        .map(|m| m.loss_magnitude.clamp(0.0, 100.0))
        .collect();

    if losses.is_empty() {
        return 0.0;
    }
    losses.iter().sum::<f64>() / losses.len() as f64
}
