//! In-memory opening book used to label theory moves.
//!
//! Reads the bincode book format (`FEN -> SAN -> stats`, move counters
//! stripped from the FEN). Without a file, a small set of main-line openings
//! is replayed into the same shape.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::LazyLock;

use chess_core::{parse_game, GameRecord};
use tracing::{info, warn};

use crate::error::ReviewError;

/// Stats for a single book move.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookMoveStats {
    pub games: i32,
    pub white_wins: i32,
    pub draws: i32,
    pub black_wins: i32,
}

/// Normalized FEN -> (bare SAN -> stats)
pub type BookEntries = HashMap<String, HashMap<String, BookMoveStats>>;

const MAIN_LINES: &[&str] = &[
    // Ruy Lopez, Closed
    "1. e4 e5 2. Nf3 Nc6 3. Bb5 a6 4. Ba4 Nf6 5. O-O Be7 6. Re1 b5 7. Bb3 d6 8. c3 O-O",
    // Italian
    "1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5 4. c3 Nf6 5. d4 exd4 6. cxd4 Bb4+",
    // Scotch
    "1. e4 e5 2. Nf3 Nc6 3. d4 exd4 4. Nxd4 Nf6 5. Nxc6 bxc6",
    // Petrov
    "1. e4 e5 2. Nf3 Nf6 3. Nxe5 d6 4. Nf3 Nxe4 5. d4 d5",
    // Sicilian Najdorf
    "1. e4 c5 2. Nf3 d6 3. d4 cxd4 4. Nxd4 Nf6 5. Nc3 a6",
    // French Classical
    "1. e4 e6 2. d4 d5 3. Nc3 Nf6 4. Bg5 Be7 5. e5 Nfd7",
    // Caro-Kann Classical
    "1. e4 c6 2. d4 d5 3. Nc3 dxe4 4. Nxe4 Bf5 5. Ng3 Bg6",
    // Queen's Gambit Declined
    "1. d4 d5 2. c4 e6 3. Nc3 Nf6 4. Bg5 Be7 5. e3 O-O 6. Nf3",
    // Slav
    "1. d4 d5 2. c4 c6 3. Nf3 Nf6 4. Nc3 dxc4 5. a4 Bf5",
    // London
    "1. d4 d5 2. Bf4 Nf6 3. e3 e6 4. Nf3 c5 5. c3 Nc6",
    // King's Indian
    "1. d4 Nf6 2. c4 g6 3. Nc3 Bg7 4. e4 d6 5. Nf3 O-O 6. Be2 e5",
    // Nimzo-Indian
    "1. d4 Nf6 2. c4 e6 3. Nc3 Bb4 4. e3 O-O",
    // English
    "1. c4 e5 2. Nc3 Nf6 3. Nf3 Nc6 4. g3 d5 5. cxd5 Nxd5",
    // Reti
    "1. Nf3 d5 2. g3 Nf6 3. Bg2 e6 4. O-O Be7",
];

static BUILTIN_BOOK: LazyLock<OpeningBook> = LazyLock::new(|| {
    let mut book = OpeningBook::default();
    for line in MAIN_LINES {
        match parse_game(line) {
            Ok(record) => book.add_game(&record, usize::MAX),
            Err(e) => warn!(line, error = %e, "Skipping unplayable book line"),
        }
    }
    book
});

#[derive(Debug, Clone, Default)]
pub struct OpeningBook {
    entries: BookEntries,
}

impl OpeningBook {
    /// Load the book from a bincode file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ReviewError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| ReviewError::Book(format!("{}: {e}", path.display())))?;
        let reader = BufReader::new(file);
        let entries: BookEntries = bincode::deserialize_from(reader)
            .map_err(|e| ReviewError::Book(format!("{}: {e}", path.display())))?;

        let book = Self { entries };
        info!(
            path = %path.display(),
            positions = book.len(),
            moves = book.move_count(),
            "Loaded opening book"
        );
        Ok(book)
    }

    /// Built-in main lines.
    pub fn builtin() -> Self {
        BUILTIN_BOOK.clone()
    }

    /// Book from `path` when given, built-in lines otherwise.
    pub fn from_config(path: Option<&Path>) -> Result<Self, ReviewError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin()),
        }
    }

    /// Write the book in the same bincode format [`OpeningBook::load`] reads.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ReviewError> {
        let path = path.as_ref();
        let book_err =
            |e: &dyn std::fmt::Display| ReviewError::Book(format!("{}: {e}", path.display()));

        let file = File::create(path).map_err(|e| book_err(&e))?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, &self.entries).map_err(|e| book_err(&e))?;
        writer.flush().map_err(|e| book_err(&e))
    }

    /// Record the first `max_plies` moves of a replayed game, crediting the
    /// game's result to every move.
    pub fn add_game(&mut self, record: &GameRecord, max_plies: usize) {
        let result = record.metadata.result.as_deref();
        for ply in record.plies.iter().take(max_plies) {
            let Some(before) = record.position_before(ply.index) else {
                break;
            };
            let stats = self
                .entries
                .entry(normalize_fen(before.fen()))
                .or_default()
                .entry(ply.bare_san().to_string())
                .or_default();
            stats.games += 1;
            match result {
                Some("1-0") => stats.white_wins += 1,
                Some("0-1") => stats.black_wins += 1,
                Some("1/2-1/2") => stats.draws += 1,
                _ => {}
            }
        }
    }

    /// Drop moves seen in fewer than `min_games` games.
    pub fn retain_min_games(&mut self, min_games: i32) {
        for moves in self.entries.values_mut() {
            moves.retain(|_, stats| stats.games >= min_games);
        }
        self.entries.retain(|_, moves| !moves.is_empty());
    }

    pub fn stats(&self, fen: &str, move_san: &str) -> Option<&BookMoveStats> {
        self.entries.get(&normalize_fen(fen))?.get(move_san)
    }

    /// Check if a move is in the book.
    pub fn contains(&self, fen: &str, move_san: &str) -> bool {
        self.entries
            .get(&normalize_fen(fen))
            .map(|moves| moves.contains_key(move_san))
            .unwrap_or(false)
    }

    /// Length of the opening run of plies that are all book moves, looking at
    /// no more than `max_plies`.
    pub fn leading_book_plies(&self, record: &GameRecord, max_plies: usize) -> usize {
        if self.entries.is_empty() {
            return 0;
        }
        record
            .plies
            .iter()
            .take(max_plies)
            .take_while(|ply| {
                record
                    .position_before(ply.index)
                    .map(|before| self.contains(before.fen(), ply.bare_san()))
                    .unwrap_or(false)
            })
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn move_count(&self) -> usize {
        self.entries.values().map(|m| m.len()).sum()
    }
}

/// Strips move counters from FEN, keeping only position + side + castling + ep.
pub fn normalize_fen(fen: &str) -> String {
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}
