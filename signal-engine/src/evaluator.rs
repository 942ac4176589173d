// Strategy Evaluator
// Fans the catalog out across tasks, joins against the cycle deadline, and
// selects the best-scoring strategy deterministically

use crate::strategies::{catalog, Strategy, StrategyScorer};
use common::MarketSnapshot;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

/// One strategy's score for a snapshot, already clamped to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyScore {
    pub strategy: Strategy,
    pub score: f64,
}

/// Runs every catalog scorer concurrently against one snapshot. A scorer
/// that errors, panics, or outlives the deadline contributes 0.0 without
/// disturbing the others.
pub struct StrategyEvaluator {
    scorers: Vec<Arc<dyn StrategyScorer>>,
    timeout: Duration,
}

impl StrategyEvaluator {
    pub fn new(timeout: Duration) -> Self {
        Self::with_scorers(catalog(), timeout)
    }

    pub fn with_scorers(scorers: Vec<Arc<dyn StrategyScorer>>, timeout: Duration) -> Self {
        Self { scorers, timeout }
    }

    /// Score every strategy. Results come back in catalog order.
    pub async fn score_all(&self, snapshot: &MarketSnapshot) -> Vec<StrategyScore> {
        let mut handles = Vec::with_capacity(self.scorers.len());
        for scorer in &self.scorers {
            let scorer = scorer.clone();
            let snapshot = snapshot.clone();
            let strategy = scorer.strategy();
            let handle = tokio::spawn(async move { scorer.score(&snapshot).await });
            handles.push((strategy, handle));
        }

        // One deadline bounds the whole fan-out, not each scorer in turn.
        let deadline = Instant::now() + self.timeout;
        let mut scores = Vec::with_capacity(handles.len());
        for (strategy, mut handle) in handles {
            let score = match timeout_at(deadline, &mut handle).await {
                Ok(Ok(Ok(raw))) => {
                    if raw.is_finite() {
                        raw.clamp(0.0, 1.0)
                    } else {
                        warn!(%strategy, raw, "scorer returned a non-finite score");
                        0.0
                    }
                }
                Ok(Ok(Err(e))) => {
                    warn!(%strategy, error = %e, "scorer failed, scoring 0");
                    0.0
                }
                Ok(Err(e)) => {
                    warn!(%strategy, error = %e, "scorer task aborted, scoring 0");
                    0.0
                }
                Err(_) => {
                    handle.abort();
                    warn!(%strategy, "scorer missed the cycle deadline, scoring 0");
                    0.0
                }
            };
            scores.push(StrategyScore { strategy, score });
        }
        scores
    }

    /// Score every strategy and pick the winner.
    pub async fn evaluate(&self, snapshot: &MarketSnapshot) -> Option<StrategyScore> {
        let scores = self.score_all(snapshot).await;
        let best = select_best(&scores);
        if let Some(best) = best {
            debug!(strategy = %best.strategy, score = best.score, "selected strategy");
        }
        best
    }
}

/// Arg-max with the first-declared strategy winning ties, so selection is
/// deterministic for identical inputs.
pub fn select_best(scores: &[StrategyScore]) -> Option<StrategyScore> {
    let mut best: Option<StrategyScore> = None;
    for candidate in scores {
        match best {
            Some(current) if candidate.score <= current.score => {}
            _ => best = Some(*candidate),
        }
    }
    best
}
