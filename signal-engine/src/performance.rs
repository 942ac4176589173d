// Performance Tracker
// Folds outcome events into the rolling metrics and persists every snapshot
// through a dedicated writer task

use crate::storage::{MetricsStore, METRICS_KEY};
use common::PerformanceMetrics;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Aggregates win/loss/profit outcomes. In-memory state is authoritative;
/// persistence is best-effort and never blocks the caller. Writes are
/// serialized through one writer task so the stored aggregate cannot
/// interleave.
pub struct PerformanceTracker {
    metrics: PerformanceMetrics,
    persist_tx: mpsc::UnboundedSender<PerformanceMetrics>,
    writer: JoinHandle<()>,
}

impl PerformanceTracker {
    /// Reload persisted metrics (empty on first run or load failure) and
    /// start the writer task.
    pub async fn load(store: Arc<dyn MetricsStore>) -> Self {
        let metrics = match store.load(METRICS_KEY).await {
            Ok(Some(metrics)) => {
                info!(
                    total = metrics.total_signals,
                    win_rate = metrics.win_rate(),
                    "restored performance metrics"
                );
                metrics
            }
            Ok(None) => PerformanceMetrics::default(),
            Err(e) => {
                warn!(error = %e, "failed to load metrics, starting fresh");
                PerformanceMetrics::default()
            }
        };

        let (persist_tx, mut persist_rx) = mpsc::unbounded_channel::<PerformanceMetrics>();
        let writer = tokio::spawn(async move {
            while let Some(snapshot) = persist_rx.recv().await {
                if let Err(e) = store.save(METRICS_KEY, &snapshot).await {
                    warn!(error = %e, "failed to persist metrics");
                }
            }
        });

        Self {
            metrics,
            persist_tx,
            writer,
        }
    }

    /// Fold one resolved outcome into the metrics and queue a persistence
    /// write. A loss always resets the win streak.
    pub fn record(&mut self, success: bool, profit: Decimal) -> &PerformanceMetrics {
        self.metrics.total_signals += 1;
        if success {
            self.metrics.successful_signals += 1;
            self.metrics.consecutive_wins += 1;
            self.metrics.max_consecutive_wins = self
                .metrics
                .max_consecutive_wins
                .max(self.metrics.consecutive_wins);
        } else {
            self.metrics.consecutive_wins = 0;
        }
        self.metrics.total_profit += profit;

        if self.persist_tx.send(self.metrics.clone()).is_err() {
            warn!("metrics writer is gone, snapshot not persisted");
        }
        &self.metrics
    }

    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.metrics
    }

    /// Drain queued persistence writes and stop the writer.
    pub async fn shutdown(self) {
        let Self {
            persist_tx, writer, ..
        } = self;
        drop(persist_tx);
        let _ = writer.await;
    }
}
