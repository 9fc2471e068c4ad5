//! Evaluation client: drives a [`PositionEvaluator`] over every position of
//! a game under the remote service's rate limit.
//!
//! Calls are issued one position at a time, in order, grouped into batches.
//! There is a throttle delay between calls and a longer pause between
//! batches. Overload answers are retried with linear backoff; a hard
//! transport failure abandons the rest of its batch.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chess_core::Position;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{EvaluatorError, ReviewError};
use crate::evaluation::{
    normalize_report, EngineReport, EvalOutcome, EvalRequest, Evaluation, ScorePerspective,
    Unscored,
};

/// Anything that can score a single position.
pub trait PositionEvaluator {
    fn evaluate(
        &self,
        request: &EvalRequest,
    ) -> impl Future<Output = Result<EngineReport, EvaluatorError>> + Send;
}

impl<T: PositionEvaluator + Sync> PositionEvaluator for &T {
    fn evaluate(
        &self,
        request: &EvalRequest,
    ) -> impl Future<Output = Result<EngineReport, EvaluatorError>> + Send {
        (**self).evaluate(request)
    }
}

/// Coarse progress: `current` of `total` positions handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

/// Cooperative cancellation shared between the caller and a running review.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Tunables for talking to the evaluator.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub search_depth: u32,
    pub max_thinking_time_ms: u64,
    pub batch_size: usize,
    /// Delay between consecutive calls
    pub throttle: Duration,
    /// Extra pause between batches
    pub batch_pause: Duration,
    /// Retries on overload (so up to `max_retries + 1` attempts)
    pub max_retries: u32,
    /// Backoff before retry N is `backoff_step * N`
    pub backoff_step: Duration,
    /// Cap on a single call
    pub call_timeout: Duration,
    pub perspective: ScorePerspective,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            search_depth: 12,
            max_thinking_time_ms: 50,
            batch_size: 15,
            throttle: Duration::from_millis(250),
            batch_pause: Duration::from_millis(1000),
            max_retries: 3,
            backoff_step: Duration::from_millis(2000),
            call_timeout: Duration::from_secs(30),
            perspective: ScorePerspective::White,
        }
    }
}

/// Outcome of one position after retries.
enum Attempt {
    Scored(Evaluation),
    /// Degrade this position only
    Degraded(Unscored),
    /// Abandon the rest of the batch
    Hard(String),
}

pub struct EvaluationClient<E> {
    evaluator: E,
    settings: ClientSettings,
}

impl<E: PositionEvaluator> EvaluationClient<E> {
    pub fn new(evaluator: E, settings: ClientSettings) -> Self {
        Self {
            evaluator,
            settings,
        }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Evaluate every position, returning one outcome per input in the same
    /// order.
    ///
    /// Fails with `EvaluationUnavailable` when a hard failure happens before
    /// any position was scored, or when nothing could be scored at all, and
    /// with `Cancelled` as soon as `cancel` is observed.
    pub async fn evaluate_positions<F>(
        &self,
        positions: &[Position],
        cancel: &CancelFlag,
        mut progress: F,
    ) -> Result<Vec<EvalOutcome>, ReviewError>
    where
        F: FnMut(Progress),
    {
        let total = positions.len();
        let batch_size = self.settings.batch_size.max(1);
        let mut outcomes: Vec<EvalOutcome> = Vec::with_capacity(total);
        let mut scored = 0usize;
        let mut calls = 0usize;

        info!(total, batch_size, "Evaluating positions");

        for (batch_idx, batch) in positions.chunks(batch_size).enumerate() {
            if batch_idx > 0 {
                pause(self.settings.batch_pause).await;
            }

            let mut abandoned = false;

            for position in batch {
                let index = outcomes.len();

                if abandoned {
                    outcomes.push(EvalOutcome::Unscored(Unscored::Skipped));
                    progress(Progress {
                        current: outcomes.len(),
                        total,
                    });
                    continue;
                }

                if cancel.is_cancelled() {
                    info!(index, total, "Evaluation cancelled");
                    return Err(ReviewError::Cancelled);
                }

                if calls > 0 {
                    pause(self.settings.throttle).await;
                }
                calls += 1;

                match self.evaluate_one(position, cancel).await? {
                    Attempt::Scored(eval) => {
                        debug!(index, score = eval.score, "Position scored");
                        scored += 1;
                        outcomes.push(EvalOutcome::Scored(eval));
                    }
                    Attempt::Degraded(reason) => {
                        warn!(index, reason = ?reason, "Position left unscored");
                        outcomes.push(EvalOutcome::Unscored(reason));
                    }
                    Attempt::Hard(message) => {
                        if scored == 0 {
                            return Err(ReviewError::EvaluationUnavailable(message));
                        }
                        warn!(index, error = %message, "Hard evaluator failure, skipping rest of batch");
                        outcomes.push(EvalOutcome::Unscored(Unscored::Transport(message)));
                        abandoned = true;
                    }
                }

                progress(Progress {
                    current: outcomes.len(),
                    total,
                });
            }
        }

        if total > 0 && scored == 0 {
            return Err(ReviewError::EvaluationUnavailable(
                "no position could be scored".to_string(),
            ));
        }

        info!(total, scored, "Evaluation finished");
        Ok(outcomes)
    }

    /// Score one position, retrying overload answers with linear backoff.
    async fn evaluate_one(
        &self,
        position: &Position,
        cancel: &CancelFlag,
    ) -> Result<Attempt, ReviewError> {
        let request = EvalRequest {
            fen: position.fen().to_string(),
            depth: self.settings.search_depth,
            max_thinking_time_ms: self.settings.max_thinking_time_ms,
        };

        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let result =
                tokio::time::timeout(self.settings.call_timeout, self.evaluator.evaluate(&request))
                    .await;

            let error = match result {
                Ok(Ok(report)) => {
                    return Ok(
                        match normalize_report(
                            &report,
                            position.side_to_move(),
                            self.settings.perspective,
                        ) {
                            Ok(eval) => Attempt::Scored(eval),
                            Err(message) => Attempt::Degraded(Unscored::Rejected(message)),
                        },
                    );
                }
                Ok(Err(e)) => e,
                Err(_) => {
                    return Ok(Attempt::Hard(format!(
                        "call timed out after {}ms",
                        self.settings.call_timeout.as_millis()
                    )));
                }
            };

            match error {
                EvaluatorError::Overloaded(message) => {
                    if attempt > self.settings.max_retries {
                        return Ok(Attempt::Degraded(Unscored::Overloaded { attempts: attempt }));
                    }
                    if cancel.is_cancelled() {
                        return Err(ReviewError::Cancelled);
                    }
                    let backoff = backoff_delay(self.settings.backoff_step, attempt);
                    warn!(
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        message = %message,
                        "Evaluator overloaded, backing off"
                    );
                    pause(backoff).await;
                }
                EvaluatorError::Rejected { code, message } => {
                    return Ok(Attempt::Degraded(Unscored::Rejected(format!(
                        "{code}: {message}"
                    ))));
                }
                EvaluatorError::Transport(message) => return Ok(Attempt::Hard(message)),
            }
        }
    }
}

/// Linear backoff before retry `attempt`, saturating instead of overflowing.
fn backoff_delay(step: Duration, attempt: u32) -> Duration {
    step.checked_mul(attempt).unwrap_or(Duration::MAX)
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
