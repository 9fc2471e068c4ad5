//! Build an opening book from PGN files.
//!
//! Replays every game, counts the first N plies of each, keeps moves seen in
//! at least `--min-games` games, and writes the bincode book that
//! `OPENING_BOOK_PATH` points the reviewer at.

use std::env;
use std::fs;
use std::time::Instant;

use chess_core::parse_games;
use game_review::OpeningBook;
use tracing::{info, warn};

const DEFAULT_MIN_GAMES: i32 = 5;
const DEFAULT_MAX_PLIES: usize = 20;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!(
            "Usage: {} <out.bin> <games.pgn>... [--min-games N] [--max-plies N]",
            args[0]
        );
        std::process::exit(1);
    }

    let out_path = &args[1];
    let mut min_games = DEFAULT_MIN_GAMES;
    let mut max_plies = DEFAULT_MAX_PLIES;
    let mut pgn_files = Vec::new();

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--min-games" => {
                min_games = args.get(i + 1).and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_MIN_GAMES);
                i += 2;
            }
            "--max-plies" => {
                max_plies = args.get(i + 1).and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_MAX_PLIES);
                i += 2;
            }
            path => {
                pgn_files.push(path.to_string());
                i += 1;
            }
        }
    }

    info!(files = pgn_files.len(), min_games, max_plies, "Building opening book");

    let mut book = OpeningBook::default();
    let mut used = 0u64;
    let mut rejected = 0u64;
    let start = Instant::now();

    for path in &pgn_files {
        let text = fs::read_to_string(path)?;
        let games = parse_games(&text)?;
        let file_games = games.len();

        for game in games {
            match game {
                Ok(record) => {
                    book.add_game(&record, max_plies);
                    used += 1;
                }
                Err(e) => {
                    warn!(file = %path, error = %e, "Skipping game");
                    rejected += 1;
                }
            }
        }
        info!(file = %path, games = file_games, "Processed");
    }

    let before = book.move_count();
    book.retain_min_games(min_games);

    info!(
        used,
        rejected,
        elapsed_s = start.elapsed().as_secs_f64(),
        moves_before = before,
        positions = book.len(),
        moves = book.move_count(),
        "Filtered book"
    );

    book.save(out_path)?;
    let size = fs::metadata(out_path)?.len();
    info!(output = %out_path, size_kb = size / 1024, "Done");

    Ok(())
}
