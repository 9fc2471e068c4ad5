//! Review configuration from environment variables

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::info;

use crate::accuracy::{AccuracyModel, Aggregation};
use crate::analysis::Thresholds;
use crate::client::ClientSettings;
use crate::error::ReviewError;
use crate::evaluation::ScorePerspective;

#[derive(Clone, Debug)]
pub struct ReviewConfig {
    /// Remote evaluator endpoint
    pub evaluator_url: String,

    /// Requested search depth per position
    pub search_depth: u32,

    /// Thinking budget sent with every request
    pub max_thinking_time_ms: u64,

    /// Positions per batch
    pub batch_size: usize,

    /// Delay between consecutive evaluator calls
    pub throttle_ms: u64,

    /// Extra pause between batches
    pub batch_pause_ms: u64,

    /// Retries on overload
    pub max_retries: u32,

    /// Linear backoff step
    pub backoff_ms: u64,

    /// Cap on a single evaluator call
    pub timeout_secs: u64,

    pub perspective: ScorePerspective,

    pub aggregation: Aggregation,

    /// Optional bincode opening book; built-in lines when unset
    pub opening_book_path: Option<PathBuf>,

    /// Book moves are only recognised within the first N plies
    pub book_max_plies: usize,

    /// Cap on itemized errors in the summary
    pub summary_max_errors: usize,

    pub thresholds: Thresholds,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            evaluator_url: "https://chess-api.com/v1".to_string(),
            search_depth: 12,
            max_thinking_time_ms: 50,
            batch_size: 15,
            throttle_ms: 250,
            batch_pause_ms: 1000,
            max_retries: 3,
            backoff_ms: 2000,
            timeout_secs: 30,
            perspective: ScorePerspective::White,
            aggregation: Aggregation::Harmonic,
            opening_book_path: None,
            book_max_plies: 20,
            summary_max_errors: 20,
            thresholds: Thresholds::default(),
        }
    }
}

/// Parse a numeric variable, keeping `default` when unset or malformed.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Parse a keyword variable; unknown keywords are a configuration error.
fn env_keyword<T>(name: &str, default: T) -> Result<T, ReviewError>
where
    T: FromStr<Err = String>,
{
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => v
            .parse()
            .map_err(|e| ReviewError::Config(format!("{name}: {e}"))),
        _ => Ok(default),
    }
}

impl ReviewConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ReviewError> {
        let defaults = Self::default();

        let evaluator_url = env::var("EVALUATOR_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.evaluator_url);

        let config = Self {
            evaluator_url,
            search_depth: env_or("SEARCH_DEPTH", defaults.search_depth),
            max_thinking_time_ms: env_or("MAX_THINKING_TIME_MS", defaults.max_thinking_time_ms),
            batch_size: env_or("EVAL_BATCH_SIZE", defaults.batch_size).max(1),
            throttle_ms: env_or("EVAL_THROTTLE_MS", defaults.throttle_ms),
            batch_pause_ms: env_or("EVAL_BATCH_PAUSE_MS", defaults.batch_pause_ms),
            max_retries: env_or("EVAL_MAX_RETRIES", defaults.max_retries),
            backoff_ms: env_or("EVAL_BACKOFF_MS", defaults.backoff_ms),
            timeout_secs: env_or("EVAL_TIMEOUT_SECS", defaults.timeout_secs),
            perspective: env_keyword("SCORE_PERSPECTIVE", defaults.perspective)?,
            aggregation: env_keyword("ACCURACY_AGGREGATION", defaults.aggregation)?,
            opening_book_path: env::var("OPENING_BOOK_PATH")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            book_max_plies: env_or("BOOK_MAX_PLIES", defaults.book_max_plies),
            summary_max_errors: env_or("SUMMARY_MAX_ERRORS", defaults.summary_max_errors),
            thresholds: defaults.thresholds,
        };

        info!(
            url = %config.evaluator_url,
            depth = config.search_depth,
            batch_size = config.batch_size,
            aggregation = ?config.aggregation,
            "Loaded review config"
        );

        Ok(config)
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            search_depth: self.search_depth,
            max_thinking_time_ms: self.max_thinking_time_ms,
            batch_size: self.batch_size.max(1),
            throttle: Duration::from_millis(self.throttle_ms),
            batch_pause: Duration::from_millis(self.batch_pause_ms),
            max_retries: self.max_retries,
            backoff_step: Duration::from_millis(self.backoff_ms),
            call_timeout: Duration::from_secs(self.timeout_secs),
            perspective: self.perspective,
        }
    }

    pub fn accuracy_model(&self) -> AccuracyModel {
        AccuracyModel::new(self.aggregation)
    }
}
