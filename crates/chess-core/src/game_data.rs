use std::fmt;

use serde::{Deserialize, Serialize};

/// Standard starting position.
pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// One of the two players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Side::White => "White",
            Side::Black => "Black",
        }
    }
}

impl From<shakmaty::Color> for Side {
    fn from(color: shakmaty::Color) -> Self {
        match color {
            shakmaty::Color::White => Side::White,
            shakmaty::Color::Black => Side::Black,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A board snapshot in FEN. Equal strings are equal positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Position(String);

impl Position {
    pub fn new(fen: impl Into<String>) -> Self {
        Self(fen.into())
    }

    pub fn fen(&self) -> &str {
        &self.0
    }

    /// Side to move, read from the active colour field.
    /// Malformed strings default to White.
    pub fn side_to_move(&self) -> Side {
        match self.0.split_whitespace().nth(1) {
            Some("b") => Side::Black,
            _ => Side::White,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self(STANDARD_START_FEN.to_string())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single half-move of the game, with the position it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlyRecord {
    /// 0-based ply index
    pub index: usize,
    /// 1-based move number shared by both halves
    pub move_number: u32,
    pub side: Side,
    /// SAN as played, including check/mate suffix
    pub notation: String,
    pub uci: String,
    pub resulting_position: Position,
}

impl PlyRecord {
    /// "14. Nf3" for White, "14... Qxb2" for Black.
    pub fn numbered_notation(&self) -> String {
        match self.side {
            Side::White => format!("{}. {}", self.move_number, self.notation),
            Side::Black => format!("{}... {}", self.move_number, self.notation),
        }
    }

    /// SAN without the check/mate suffix.
    pub fn bare_san(&self) -> &str {
        self.notation.trim_end_matches(['+', '#'])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMetadata {
    pub white: Option<String>,
    pub black: Option<String>,
    pub result: Option<String>, // "1-0", "0-1", "1/2-1/2"
    pub event: Option<String>,
    pub date: Option<String>,
}

/// A fully replayed game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub metadata: GameMetadata,
    pub start: Position,
    pub plies: Vec<PlyRecord>,
}

impl GameRecord {
    /// Start position followed by the position after every ply.
    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        std::iter::once(&self.start).chain(self.plies.iter().map(|p| &p.resulting_position))
    }

    /// Position the given ply was played from.
    pub fn position_before(&self, ply_index: usize) -> Option<&Position> {
        if ply_index == 0 {
            Some(&self.start)
        } else {
            self.plies
                .get(ply_index - 1)
                .map(|p| &p.resulting_position)
        }
    }

    pub fn ply_count(&self) -> usize {
        self.plies.len()
    }
}
