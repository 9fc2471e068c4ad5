//! Game record parsing and replay.
//!
//! Turns PGN movetext into the ordered list of positions an evaluator sees,
//! one canonical FEN per ply.

pub mod error;
pub mod game_data;
pub mod pgn;

pub use error::RecordError;
pub use game_data::{GameMetadata, GameRecord, PlyRecord, Position, Side, STANDARD_START_FEN};
pub use pgn::{parse_game, parse_games};
