//! String-level move validation helpers
//!
//! Thin layer over [`crate::rules`] for callers that speak FEN and UCI
//! strings. Nothing here errors: bad input is reported as `false`, an empty
//! list or `None`.

use crate::rules::{self, Move, Position};

/// Is `mv` a legal move in `fen`?
pub fn validate(fen: &str, mv: &str) -> bool {
    rules::is_legal(fen, mv)
}

/// Legal moves in `fen` as UCI strings
pub fn legal_moves(fen: &str) -> Vec<String> {
    rules::legal_moves(fen)
        .iter()
        .map(|mv| mv.to_string())
        .collect()
}

/// FEN of the position after playing `mv` in `fen`
pub fn make_move(fen: &str, mv: &str) -> Option<String> {
    let position = Position::from_fen(fen).ok()?;
    let mv: Move = mv.parse().ok()?;
    position.play(&mv).map(|next| next.fen())
}
