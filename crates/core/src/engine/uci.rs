//! Parsing of UCI engine replies
//!
//! A search produces a stream of `info` lines followed by one `bestmove`
//! line. [`SearchReport`] folds the stream into an [`EvaluationResult`].

use super::evaluation::{Evaluation, EvaluationResult};
use super::session::EngineError;
use crate::rules::Move;

/// Upper bound on lines read while waiting for a single reply.
pub const MAX_UCI_LINES: usize = 20_000;

/// The fields of an `info` line that matter for evaluation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InfoLine {
    pub depth: Option<u32>,
    pub multipv: Option<u32>,
    pub evaluation: Option<Evaluation>,
    /// Score is only a lowerbound/upperbound from an aspiration window
    pub bound: bool,
    pub nodes: Option<u64>,
    pub pv: Vec<String>,
}

/// Parses an info line.
///
/// Format: "info depth X seldepth Y multipv 1 score cp Z nodes N ... pv m1 m2"
/// Returns `None` for lines that are not `info` lines.
pub fn parse_info(line: &str) -> Option<InfoLine> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.first() != Some(&"info") {
        return None;
    }

    let mut info = InfoLine::default();
    let mut i = 1;

    while i < parts.len() {
        match parts[i] {
            "depth" => {
                info.depth = parts.get(i + 1).and_then(|s| s.parse().ok());
                i += 2;
            }
            "multipv" => {
                info.multipv = parts.get(i + 1).and_then(|s| s.parse().ok());
                i += 2;
            }
            "score" => {
                let value = parts.get(i + 2).and_then(|s| s.parse::<i32>().ok());
                info.evaluation = match (parts.get(i + 1), value) {
                    (Some(&"cp"), Some(cp)) => Some(Evaluation::Centipawns(cp)),
                    (Some(&"mate"), Some(m)) => Some(Evaluation::Mate(m)),
                    _ => None,
                };
                i += 3;
            }
            "lowerbound" | "upperbound" => {
                info.bound = true;
                i += 1;
            }
            "nodes" => {
                info.nodes = parts.get(i + 1).and_then(|s| s.parse().ok());
                i += 2;
            }
            "pv" => {
                // Everything after "pv" is the principal variation
                info.pv = parts[i + 1..].iter().map(|s| s.to_string()).collect();
                break;
            }
            // free text to the end of the line
            "string" => break,
            _ => {
                i += 1;
            }
        }
    }

    Some(info)
}

/// Accumulates a search's `info` lines until `bestmove` arrives
#[derive(Debug, Default)]
pub struct SearchReport {
    evaluation: Option<Evaluation>,
    depth: u32,
    nodes: u64,
    pv: Vec<String>,
}

impl SearchReport {
    pub fn absorb(&mut self, info: InfoLine) {
        if let Some(nodes) = info.nodes {
            self.nodes = nodes;
        }

        // Secondary lines and aspiration-window bounds don't replace the main line
        if info.bound || info.multipv.is_some_and(|k| k > 1) {
            return;
        }

        if let Some(evaluation) = info.evaluation {
            self.evaluation = Some(evaluation);
            if let Some(depth) = info.depth {
                self.depth = depth;
            }
            if !info.pv.is_empty() {
                self.pv = info.pv;
            }
        }
    }

    /// Completes the report with the text following `bestmove`
    ///
    /// "bestmove e2e4 ponder e7e5", or "bestmove (none)" when there is no
    /// legal move.
    pub fn finish(self, bestmove: &str) -> Result<EvaluationResult, EngineError> {
        let token = bestmove
            .split_whitespace()
            .next()
            .ok_or_else(|| EngineError::Protocol("bestmove without a move".into()))?;

        if token == "(none)" || token == "0000" {
            return Ok(EvaluationResult {
                evaluation: self.evaluation,
                best_move: None,
                principal_variation: Vec::new(),
                depth: self.depth,
                nodes: self.nodes,
            });
        }

        let best: Move = token
            .parse()
            .map_err(|_| EngineError::Protocol(format!("unparseable best move {:?}", token)))?;

        let evaluation = self.evaluation.ok_or_else(|| {
            EngineError::Protocol(format!("best move {} reported without a score", best))
        })?;

        let mut pv = self
            .pv
            .iter()
            .map(|m| m.parse::<Move>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| EngineError::Protocol(format!("bad principal variation: {}", e)))?;

        if pv.first() != Some(&best) {
            pv = vec![best];
        }

        Ok(EvaluationResult {
            evaluation: Some(evaluation),
            best_move: Some(best),
            principal_variation: pv,
            depth: self.depth,
            nodes: self.nodes,
        })
    }
}
