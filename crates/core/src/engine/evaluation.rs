//! Types for representing engine evaluations

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rules::Move;

/// Represents a position evaluation
///
/// Scores are from the perspective of the side to move, exactly as the
/// engine reports them: positive means the side to move is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Evaluation {
    /// Centipawn score
    Centipawns(i32),
    /// Forced mate in N moves (negative = the side to move gets mated)
    Mate(i32),
}

impl Evaluation {
    pub fn centipawns(&self) -> Option<i32> {
        match self {
            Evaluation::Centipawns(cp) => Some(*cp),
            Evaluation::Mate(_) => None,
        }
    }

    pub fn mate_in(&self) -> Option<i32> {
        match self {
            Evaluation::Mate(moves) => Some(*moves),
            Evaluation::Centipawns(_) => None,
        }
    }

    /// Centipawns converted to pawns; `None` for mate scores
    pub fn pawns(&self) -> Option<f64> {
        self.centipawns().map(|cp| f64::from(cp) / 100.0)
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluation::Centipawns(cp) => {
                let score = *cp as f32 / 100.0;
                if score >= 0.0 {
                    write!(f, "+{:.2}", score)
                } else {
                    write!(f, "{:.2}", score)
                }
            }
            Evaluation::Mate(moves) => write!(f, "M{}", moves),
        }
    }
}

/// Result of evaluating one position
///
/// `evaluation` is only ever `None` together with `best_move`, when the
/// engine found nothing to play and reported no score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub evaluation: Option<Evaluation>,
    /// `None` when the side to move has no legal moves
    pub best_move: Option<Move>,
    /// Best line of play, starting with `best_move`
    pub principal_variation: Vec<Move>,
    /// Depth the engine reached
    pub depth: u32,
    /// Nodes searched
    pub nodes: u64,
}

impl EvaluationResult {
    pub fn centipawns(&self) -> Option<i32> {
        self.evaluation.and_then(|e| e.centipawns())
    }

    pub fn mate_in(&self) -> Option<i32> {
        self.evaluation.and_then(|e| e.mate_in())
    }

    /// Returns a brief summary of the evaluation
    pub fn summary(&self) -> String {
        let eval = self
            .evaluation
            .map(|e| e.to_string())
            .unwrap_or_else(|| "-".to_string());
        let best = self
            .best_move
            .map(|m| m.to_string())
            .unwrap_or_else(|| "(none)".to_string());
        let pv = self
            .principal_variation
            .iter()
            .take(5)
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(" ");

        format!(
            "Eval: {} | Best: {} | Depth: {} | PV: {}",
            eval, best, self.depth, pv
        )
    }
}
