//! Move legality and legal-move generation for FEN positions
//!
//! Wraps shakmaty behind two small value types, [`Position`] and [`Move`].
//! The free functions at the bottom fail closed: malformed input gives
//! `false` or an empty list, never an error.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use shakmaty::{
    fen::Fen, CastlingMode, Chess, Color, EnPassantMode, File, Position as _, PositionError as SetupError,
    Role, Square,
};
use thiserror::Error;

/// Why a FEN string could not become a [`Position`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    #[error("malformed FEN: {0}")]
    Syntax(String),

    #[error("unplayable position: {0}")]
    Setup(String),
}

/// Why a string is not a move in UCI notation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed move notation: {0:?}")]
pub struct MoveParseError(pub String);

/// Whether the side to move still has something to play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Ongoing,
    Checkmate,
    Stalemate,
}

/// A full board state parsed from FEN
#[derive(Debug, Clone)]
pub struct Position {
    board: Chess,
}

impl Position {
    /// Parses a FEN string.
    ///
    /// Too much material and impossible check configurations are tolerated;
    /// anything the move generator cannot work with (bad syntax, missing
    /// kings, pawns on the back rank) is rejected.
    pub fn from_fen(fen: &str) -> Result<Self, PositionError> {
        let parsed: Fen = fen
            .trim()
            .parse()
            .map_err(|e| PositionError::Syntax(format!("{}", e)))?;

        let board: Chess = parsed
            .into_position(CastlingMode::Standard)
            .or_else(SetupError::ignore_too_much_material)
            .or_else(SetupError::ignore_impossible_check)
            .map_err(|e| PositionError::Setup(format!("{}", e)))?;

        Ok(Self { board })
    }

    /// The standard starting position
    pub fn starting() -> Self {
        Self {
            board: Chess::default(),
        }
    }

    /// Canonical FEN for this position
    pub fn fen(&self) -> String {
        Fen::from_position(&self.board, EnPassantMode::Legal).to_string()
    }

    pub fn side_to_move(&self) -> Color {
        self.board.turn()
    }

    pub fn is_check(&self) -> bool {
        self.board.is_check()
    }

    pub fn outcome(&self) -> Outcome {
        if self.board.is_checkmate() {
            Outcome::Checkmate
        } else if self.board.is_stalemate() {
            Outcome::Stalemate
        } else {
            Outcome::Ongoing
        }
    }

    /// Every legal move for the side to move, in UCI form
    pub fn legal_moves(&self) -> Vec<Move> {
        self.board
            .legal_moves()
            .iter()
            .filter_map(Move::from_shakmaty)
            .collect()
    }

    pub fn is_legal(&self, mv: &Move) -> bool {
        self.find_legal(mv).is_some()
    }

    /// Plays a move, returning the resulting position, or `None` if the
    /// move is not legal here
    pub fn play(&self, mv: &Move) -> Option<Position> {
        let legal = self.find_legal(mv)?;
        self.board
            .clone()
            .play(legal)
            .ok()
            .map(|board| Position { board })
    }

    fn find_legal(&self, mv: &Move) -> Option<shakmaty::Move> {
        self.board
            .legal_moves()
            .into_iter()
            .find(|candidate| Move::from_shakmaty(candidate).as_ref() == Some(mv))
    }
}

impl FromStr for Position {
    type Err = PositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::from_fen(s)
    }
}

/// A move in UCI long algebraic notation, e.g. `e2e4` or `e7e8q`
///
/// Castling is written as the king's two-square step (`e1g1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Role>,
}

impl Move {
    /// Converts a shakmaty move to UCI form; drops have no UCI spelling here
    fn from_shakmaty(mv: &shakmaty::Move) -> Option<Self> {
        match mv {
            shakmaty::Move::Normal {
                from, to, promotion, ..
            } => Some(Move {
                from: *from,
                to: *to,
                promotion: *promotion,
            }),
            shakmaty::Move::EnPassant { from, to } => Some(Move {
                from: *from,
                to: *to,
                promotion: None,
            }),
            shakmaty::Move::Castle { king, rook } => {
                let king_to = if rook.file() > king.file() {
                    Square::from_coords(File::G, king.rank())
                } else {
                    Square::from_coords(File::C, king.rank())
                };
                Some(Move {
                    from: *king,
                    to: king_to,
                    promotion: None,
                })
            }
            shakmaty::Move::Put { .. } => None,
        }
    }
}

impl FromStr for Move {
    type Err = MoveParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || MoveParseError(s.to_string());
        let text = s.trim();
        if !text.is_ascii() || !(4..=5).contains(&text.len()) {
            return Err(malformed());
        }

        let from: Square = text[0..2].parse().map_err(|_| malformed())?;
        let to: Square = text[2..4].parse().map_err(|_| malformed())?;
        let promotion = match text[4..].chars().next() {
            None => None,
            Some('q') => Some(Role::Queen),
            Some('r') => Some(Role::Rook),
            Some('b') => Some(Role::Bishop),
            Some('n') => Some(Role::Knight),
            Some(_) => return Err(malformed()),
        };

        if from == to {
            return Err(malformed());
        }

        Ok(Move { from, to, promotion })
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let promo = match self.promotion {
            Some(Role::Queen) => "q",
            Some(Role::Rook) => "r",
            Some(Role::Bishop) => "b",
            Some(Role::Knight) => "n",
            _ => "",
        };
        write!(f, "{}{}{}", self.from, self.to, promo)
    }
}

impl Serialize for Move {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// True when `mv` parses and is legal in the position described by `fen`
pub fn is_legal(fen: &str, mv: &str) -> bool {
    let (Ok(position), Ok(mv)) = (Position::from_fen(fen), mv.parse::<Move>()) else {
        return false;
    };
    position.is_legal(&mv)
}

/// All legal moves in the position described by `fen`; empty when the FEN
/// does not parse or the side to move is mated or stalemated
pub fn legal_moves(fen: &str) -> Vec<Move> {
    Position::from_fen(fen)
        .map(|position| position.legal_moves())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    const AFTER_D4: &str = "rnbqkbnr/pppppppp/8/8/3P4/8/PPP1PPPP/RNBQKBNR b KQkq d3 0 1";
    const FOOLS_MATE: &str = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";
    const STALEMATE: &str = "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1";

    #[test]
    fn test_starting_position() {
        let position = Position::from_fen(START).unwrap();
        assert_eq!(position.side_to_move(), Color::White);
        // 16 pawn moves + 4 knight moves
        assert_eq!(position.legal_moves().len(), 20);
        assert!(!position.is_check());
        assert_eq!(position.outcome(), Outcome::Ongoing);
    }

    #[test]
    fn test_side_to_move_decides_legality() {
        assert!(is_legal(AFTER_D4, "d7d5"));
        assert!(!is_legal(AFTER_D4, "e2e4"));
    }

    #[test]
    fn test_malformed_input_fails_closed() {
        assert!(!is_legal("not a fen", "e2e4"));
        assert!(!is_legal(START, "e2"));
        assert!(!is_legal(START, "e2e4e"));
        assert!(!is_legal(START, "0000"));
        assert!(!is_legal(START, "Nf3"));
        assert!(legal_moves("rnbqkbnr/pppppppp/8 w KQkq - 0 1").is_empty());
        assert!(legal_moves("").is_empty());
    }

    #[test]
    fn test_no_moves_when_game_is_over() {
        assert!(legal_moves(FOOLS_MATE).is_empty());
        assert_eq!(
            Position::from_fen(FOOLS_MATE).unwrap().outcome(),
            Outcome::Checkmate
        );
        assert!(legal_moves(STALEMATE).is_empty());
        assert_eq!(
            Position::from_fen(STALEMATE).unwrap().outcome(),
            Outcome::Stalemate
        );
    }

    #[test]
    fn test_missing_king_is_rejected() {
        let result = Position::from_fen("8/8/8/8/8/8/8/K7 w - - 0 1");
        assert!(matches!(result, Err(PositionError::Setup(_))));
    }

    #[test]
    fn test_extra_material_is_tolerated() {
        // eleven knights cannot come from eight promotions
        let crowded = "NNNNNNNN/NNN5/8/8/8/8/8/K6k w - - 0 1";
        assert!(Position::from_fen(crowded).is_ok());
    }

    #[test]
    fn test_castling_uses_king_step() {
        let fen = "r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1";
        let moves: Vec<String> = legal_moves(fen).iter().map(|m| m.to_string()).collect();
        assert!(moves.contains(&"e1g1".to_string()));
        assert!(moves.contains(&"e1c1".to_string()));
        assert!(is_legal(fen, "e1g1"));
    }

    #[test]
    fn test_promotion_round_trip() {
        let fen = "8/4P3/8/8/8/8/k7/4K3 w - - 0 1";
        let mv: Move = "e7e8n".parse().unwrap();
        assert_eq!(mv.promotion, Some(Role::Knight));
        assert_eq!(mv.to_string(), "e7e8n");
        assert!(is_legal(fen, "e7e8q"));
        assert!(!is_legal(fen, "e7e8"));
        assert!(!is_legal(fen, "e7e8k"));
    }

    #[test]
    fn test_en_passant() {
        let fen = "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3";
        assert!(is_legal(fen, "e5f6"));
    }

    #[test]
    fn test_play_returns_next_position() {
        let next = Position::starting().play(&"e2e4".parse().unwrap()).unwrap();
        assert_eq!(next.side_to_move(), Color::Black);
        assert!(next.fen().starts_with("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq"));
        assert!(Position::starting().play(&"e2e5".parse().unwrap()).is_none());
    }

    #[test]
    fn test_move_serializes_as_string() {
        let mv: Move = "g1f3".parse().unwrap();
        assert_eq!(serde_json::to_string(&mv).unwrap(), "\"g1f3\"");
    }
}
