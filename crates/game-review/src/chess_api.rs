//! Remote position evaluator over HTTP (chess-api.com style JSON API).

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::PositionEvaluator;
use crate::error::{EvaluatorError, ReviewError};
use crate::evaluation::{EngineReport, EvalRequest};

/// Error codes the service uses when it is at capacity.
const OVERLOAD_CODES: &[&str] = &["HIGH_USAGE", "OVERLOADED", "RATE_LIMITED", "TOO_MANY_REQUESTS"];

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest<'a> {
    fen: &'a str,
    depth: u32,
    max_thinking_time: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    #[serde(rename = "type")]
    kind: Option<String>,
    error: Option<String>,
    text: Option<String>,
    /// Score in pawns
    eval: Option<f64>,
    win_chance: Option<f64>,
    mate: Option<i32>,
    depth: Option<u32>,
    /// Best move in UCI notation
    #[serde(rename = "move")]
    best_move: Option<String>,
    san: Option<String>,
}

pub struct ChessApiEvaluator {
    client: Client,
    url: String,
}

impl ChessApiEvaluator {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ReviewError> {
        let client = Client::builder()
            .user_agent("GameReview/1.0")
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl PositionEvaluator for ChessApiEvaluator {
    async fn evaluate(&self, request: &EvalRequest) -> Result<EngineReport, EvaluatorError> {
        debug!(fen = %request.fen, depth = request.depth, "Evaluator <");

        let resp = self
            .client
            .post(&self.url)
            .json(&ApiRequest {
                fen: &request.fen,
                depth: request.depth,
                max_thinking_time: request.max_thinking_time_ms,
            })
            .send()
            .await
            .map_err(|e| EvaluatorError::Transport(format!("Request error: {e}")))?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(EvaluatorError::Overloaded(format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(EvaluatorError::Transport(format!("HTTP {status}")));
        }

        let body: ApiResponse = resp
            .json()
            .await
            .map_err(|e| EvaluatorError::Transport(format!("JSON parse error: {e}")))?;

        debug!(eval = ?body.eval, mate = ?body.mate, best = ?body.best_move, "Evaluator >");
        interpret(body)
    }
}

/// Map a decoded response body to a report or a classified error.
fn interpret(body: ApiResponse) -> Result<EngineReport, EvaluatorError> {
    let is_error = body.kind.as_deref() == Some("error") || body.error.is_some();
    if is_error {
        let code = body.error.unwrap_or_else(|| "UNKNOWN".to_string());
        let message = body.text.unwrap_or_default();
        if OVERLOAD_CODES.contains(&code.to_ascii_uppercase().as_str()) {
            return Err(EvaluatorError::Overloaded(format!("{code}: {message}")));
        }
        return Err(EvaluatorError::Rejected { code, message });
    }

    Ok(EngineReport {
        score_pawns: body.eval,
        win_chance: body.win_chance,
        mate: body.mate,
        best_move_uci: body.best_move,
        best_move_san: body.san,
        depth: body.depth.unwrap_or(0),
    })
}
