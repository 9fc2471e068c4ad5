//! review-game: review one PGN file against the remote evaluator.
//!
//! Usage: review-game <game.pgn> [--json]

use std::time::Duration;

use anyhow::Context;
use game_review::{CancelFlag, ChessApiEvaluator, GameReviewer, Progress, ReviewConfig};
use tracing::{info, warn};

struct Args {
    path: String,
    json: bool,
}

fn parse_args() -> Option<Args> {
    let mut path = None;
    let mut json = false;
    for arg in std::env::args().skip(1) {
        if arg == "--json" {
            json = true;
        } else if path.is_none() {
            path = Some(arg);
        }
    }
    path.map(|path| Args { path, json })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let Some(args) = parse_args() else {
        anyhow::bail!("usage: review-game <game.pgn> [--json]");
    };

    let movetext = std::fs::read_to_string(&args.path)
        .with_context(|| format!("reading {}", args.path))?;

    let config = ReviewConfig::from_env()?;
    let evaluator = ChessApiEvaluator::new(
        config.evaluator_url.clone(),
        Duration::from_secs(config.timeout_secs),
    )?;
    let reviewer = GameReviewer::new(evaluator, &config)?;

    let cancel = CancelFlag::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received Ctrl-C, cancelling after the current call");
            on_signal.cancel();
        }
    });

    let evaluation = reviewer
        .evaluate_game_with(&movetext, &cancel, |p: Progress| {
            info!(current = p.current, total = p.total, "Progress");
        })
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
    } else {
        println!("{}", evaluation.summary_text);
    }

    Ok(())
}
