// Signal Engine
// Serialized owner of the pipeline: one actor holds the ledger, metrics,
// and config; strategy scoring is the only fan-out

use crate::builder::SignalBuilder;
use crate::config::{EngineConfig, RiskLevel, TradingMode};
use crate::evaluator::StrategyEvaluator;
use crate::gate::QualityGate;
use crate::ledger::{ResolveError, SignalLedger};
use crate::performance::PerformanceTracker;
use crate::scheduler::Debouncer;
use crate::signals::Signal;
use crate::storage::MetricsStore;
use anyhow::{anyhow, Result};
use common::{MarketIntelligence, PerformanceMetrics};
use position_sizing::PositionSizer;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Commands processed by the engine in arrival order
pub enum EngineCommand {
    SetMode(TradingMode),
    SetRiskLevel(RiskLevel),
    MarkActive {
        id: Uuid,
        respond_to: mpsc::Sender<Result<(), ResolveError>>,
    },
    Resolve {
        id: Uuid,
        success: bool,
        profit: Decimal,
        respond_to: mpsc::Sender<Result<(), ResolveError>>,
    },
    Cancel {
        id: Uuid,
        respond_to: mpsc::Sender<Result<(), ResolveError>>,
    },
    GetSignals {
        respond_to: mpsc::Sender<Vec<Signal>>,
    },
    GetMetrics {
        respond_to: mpsc::Sender<PerformanceMetrics>,
    },
    Shutdown,
}

/// The signal engine actor. Owns every piece of mutable pipeline state and
/// serializes all access through its command channel.
pub struct SignalEngine {
    config: EngineConfig,
    risk_level: RiskLevel,
    intel: Arc<dyn MarketIntelligence>,
    evaluator: StrategyEvaluator,
    builder: SignalBuilder,
    gate: QualityGate,
    ledger: SignalLedger,
    tracker: PerformanceTracker,
    latest_confluence: f64,
    published_tx: watch::Sender<Vec<Signal>>,
    control_rx: Option<mpsc::Receiver<EngineCommand>>,
    confluence_rx: Option<mpsc::Receiver<f64>>,
}

impl SignalEngine {
    /// Create the engine and its handle. Restores persisted metrics before
    /// the first cycle can run.
    pub async fn new(
        config: EngineConfig,
        intel: Arc<dyn MarketIntelligence>,
        sizer: Arc<dyn PositionSizer>,
        store: Arc<dyn MetricsStore>,
    ) -> (Self, EngineHandle) {
        let (control_tx, control_rx) = mpsc::channel(100);
        let (confluence_tx, confluence_rx) = mpsc::channel(100);
        let (published_tx, published_rx) = watch::channel(Vec::new());

        let tracker = PerformanceTracker::load(store).await;
        let scorer_timeout = Duration::from_secs(config.scorer_timeout_secs);

        let engine = Self {
            risk_level: config.risk_level,
            intel,
            evaluator: StrategyEvaluator::new(scorer_timeout),
            builder: SignalBuilder::new(sizer, config.account_balance),
            gate: QualityGate::default(),
            ledger: SignalLedger::new(config.mode, config.history_capacity),
            tracker,
            latest_confluence: 0.0,
            published_tx,
            control_rx: Some(control_rx),
            confluence_rx: Some(confluence_rx),
            config,
        };

        let handle = EngineHandle {
            control_tx,
            confluence_tx,
            published_rx,
        };
        (engine, handle)
    }

    /// Run the engine until shutdown. Two trigger sources feed the same
    /// cycle entry point; the serial loop makes every cycle single-flight,
    /// and skipped interval ticks plus debounce coalescing drop triggers
    /// that arrive while a cycle is in progress.
    pub async fn run(mut self) -> Result<()> {
        let mut control_rx = self
            .control_rx
            .take()
            .ok_or_else(|| anyhow!("Engine already started"))?;
        let mut confluence_rx = self
            .confluence_rx
            .take()
            .ok_or_else(|| anyhow!("Engine already started"))?;

        let mut interval =
            tokio::time::interval(Duration::from_secs(self.config.cycle_interval_secs));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut debounce = Debouncer::new(Duration::from_secs(self.config.debounce_secs));
        let mut confluence_open = true;

        info!(mode = ?self.ledger.mode(), "signal engine started");

        loop {
            tokio::select! {
                maybe_cmd = control_rx.recv() => {
                    match maybe_cmd {
                        Some(EngineCommand::Shutdown) | None => break,
                        Some(cmd) => self.handle_command(cmd).await,
                    }
                }

                maybe_score = confluence_rx.recv(), if confluence_open => {
                    match maybe_score {
                        Some(score) => {
                            self.latest_confluence = score;
                            debounce.poke();
                        }
                        None => {
                            debug!("confluence stream closed");
                            confluence_open = false;
                        }
                    }
                }

                _ = interval.tick() => {
                    self.run_cycle("interval").await;
                }

                _ = debounce.expired() => {
                    debounce.disarm();
                    if self.latest_confluence > self.ledger.mode().min_confidence() {
                        self.run_cycle("confluence").await;
                    } else {
                        debug!(
                            score = self.latest_confluence,
                            "settled confluence below mode floor"
                        );
                    }
                }
            }
        }

        // Drain queued metrics writes before exiting.
        self.tracker.shutdown().await;
        info!("signal engine stopped");
        Ok(())
    }

    async fn handle_command(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::SetMode(mode) => {
                let dropped = self.ledger.set_mode(mode);
                info!(?mode, dropped, "trading mode updated");
                self.publish();
            }

            EngineCommand::SetRiskLevel(level) => {
                self.risk_level = level;
                info!(?level, "risk level updated");
            }

            EngineCommand::MarkActive { id, respond_to } => {
                let result = self.ledger.activate(id);
                if let Err(e) = &result {
                    warn!(error = %e, "activate ignored");
                } else {
                    self.publish();
                }
                let _ = respond_to.send(result).await;
            }

            EngineCommand::Resolve {
                id,
                success,
                profit,
                respond_to,
            } => {
                let result = match self.ledger.resolve(id, success, profit) {
                    Ok(_) => {
                        let metrics = self.tracker.record(success, profit);
                        info!(
                            signal = %id,
                            win_rate = metrics.win_rate(),
                            streak = metrics.consecutive_wins,
                            "outcome recorded"
                        );
                        self.publish();
                        Ok(())
                    }
                    Err(e) => {
                        warn!(error = %e, "resolve ignored");
                        Err(e)
                    }
                };
                let _ = respond_to.send(result).await;
            }

            EngineCommand::Cancel { id, respond_to } => {
                let result = match self.ledger.cancel(id) {
                    Ok(_) => {
                        self.publish();
                        Ok(())
                    }
                    Err(e) => {
                        warn!(error = %e, "cancel ignored");
                        Err(e)
                    }
                };
                let _ = respond_to.send(result).await;
            }

            EngineCommand::GetSignals { respond_to } => {
                let _ = respond_to.send(self.ledger.live_signals().to_vec()).await;
            }

            EngineCommand::GetMetrics { respond_to } => {
                let _ = respond_to.send(self.tracker.metrics().clone()).await;
            }

            // Intercepted by the run loop before dispatch.
            EngineCommand::Shutdown => {}
        }
    }

    /// One generation cycle: snapshot, gate on capacity and confluence,
    /// evaluate, build, validate, track. Every failure path degrades to
    /// "no signal this cycle".
    async fn run_cycle(&mut self, trigger: &str) {
        let budget = Duration::from_secs(self.config.scorer_timeout_secs);

        let snapshot = match tokio::time::timeout(budget, self.intel.snapshot()).await {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(e)) => {
                warn!(error = %e, trigger, "snapshot unavailable, skipping cycle");
                return;
            }
            Err(_) => {
                warn!(trigger, "snapshot fetch timed out, skipping cycle");
                return;
            }
        };

        let mode = self.ledger.mode();
        if self.ledger.open_count() >= mode.max_signals_per_day() {
            debug!(trigger, open = self.ledger.open_count(), "signal cap reached");
            return;
        }

        let confluence = self.latest_confluence;
        if confluence < mode.min_confidence() {
            debug!(trigger, confluence, "no opportunity this cycle");
            return;
        }

        let best = match self.evaluator.evaluate(&snapshot).await {
            Some(best) => best,
            None => {
                warn!("strategy catalog is empty");
                return;
            }
        };

        let candidate = match tokio::time::timeout(
            budget,
            self.builder
                .build(best.strategy, &snapshot, confluence, self.risk_level),
        )
        .await
        {
            Ok(Ok(candidate)) => candidate,
            Ok(Err(e)) => {
                warn!(error = %e, "candidate construction failed");
                return;
            }
            Err(_) => {
                warn!("position sizing timed out, skipping cycle");
                return;
            }
        };

        if let Err(rejection) = self
            .gate
            .check(&candidate, self.ledger.live_signals(), &snapshot)
        {
            debug!(%rejection, strategy = %candidate.strategy, "candidate rejected");
            self.publish();
            return;
        }

        match self.ledger.submit(candidate) {
            Ok(id) => {
                info!(
                    signal = %id,
                    strategy = %best.strategy,
                    score = best.score,
                    trigger,
                    "signal generated"
                );
            }
            Err(rejection) => {
                debug!(%rejection, "submission rejected");
            }
        }
        self.publish();
    }

    fn publish(&self) {
        self.published_tx
            .send_replace(self.ledger.live_signals().to_vec());
    }
}

/// Cloneable facade over the engine's command channel and published state.
#[derive(Clone)]
pub struct EngineHandle {
    control_tx: mpsc::Sender<EngineCommand>,
    confluence_tx: mpsc::Sender<f64>,
    published_rx: watch::Receiver<Vec<Signal>>,
}

impl EngineHandle {
    /// Subscribe to the published live signal list.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Signal>> {
        self.published_rx.clone()
    }

    /// Feed one observation from the external composite-score stream.
    pub async fn observe_confluence(&self, score: f64) -> Result<()> {
        self.confluence_tx
            .send(score)
            .await
            .map_err(|e| anyhow!("Failed to send confluence score: {}", e))
    }

    pub async fn set_mode(&self, mode: TradingMode) -> Result<()> {
        self.control_tx
            .send(EngineCommand::SetMode(mode))
            .await
            .map_err(|e| anyhow!("Failed to send mode change: {}", e))
    }

    pub async fn set_risk_level(&self, level: RiskLevel) -> Result<()> {
        self.control_tx
            .send(EngineCommand::SetRiskLevel(level))
            .await
            .map_err(|e| anyhow!("Failed to send risk level change: {}", e))
    }

    /// Report a realized outcome. Unknown or already-terminal ids come back
    /// as an error without mutating anything.
    pub async fn resolve(&self, id: Uuid, success: bool, profit: Decimal) -> Result<()> {
        let (tx, mut rx) = mpsc::channel(1);
        self.control_tx
            .send(EngineCommand::Resolve {
                id,
                success,
                profit,
                respond_to: tx,
            })
            .await
            .map_err(|e| anyhow!("Failed to send resolve command: {}", e))?;
        let outcome = rx
            .recv()
            .await
            .ok_or_else(|| anyhow!("Resolve response channel closed"))?;
        outcome.map_err(anyhow::Error::from)
    }

    pub async fn mark_active(&self, id: Uuid) -> Result<()> {
        let (tx, mut rx) = mpsc::channel(1);
        self.control_tx
            .send(EngineCommand::MarkActive { id, respond_to: tx })
            .await
            .map_err(|e| anyhow!("Failed to send activate command: {}", e))?;
        let outcome = rx
            .recv()
            .await
            .ok_or_else(|| anyhow!("Activate response channel closed"))?;
        outcome.map_err(anyhow::Error::from)
    }

    pub async fn cancel(&self, id: Uuid) -> Result<()> {
        let (tx, mut rx) = mpsc::channel(1);
        self.control_tx
            .send(EngineCommand::Cancel { id, respond_to: tx })
            .await
            .map_err(|e| anyhow!("Failed to send cancel command: {}", e))?;
        let outcome = rx
            .recv()
            .await
            .ok_or_else(|| anyhow!("Cancel response channel closed"))?;
        outcome.map_err(anyhow::Error::from)
    }

    pub async fn live_signals(&self) -> Result<Vec<Signal>> {
        let (tx, mut rx) = mpsc::channel(1);
        self.control_tx
            .send(EngineCommand::GetSignals { respond_to: tx })
            .await
            .map_err(|e| anyhow!("Failed to request signals: {}", e))?;
        rx.recv()
            .await
            .ok_or_else(|| anyhow!("Signals response channel closed"))
    }

    pub async fn metrics(&self) -> Result<PerformanceMetrics> {
        let (tx, mut rx) = mpsc::channel(1);
        self.control_tx
            .send(EngineCommand::GetMetrics { respond_to: tx })
            .await
            .map_err(|e| anyhow!("Failed to request metrics: {}", e))?;
        rx.recv()
            .await
            .ok_or_else(|| anyhow!("Metrics response channel closed"))
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.control_tx
            .send(EngineCommand::Shutdown)
            .await
            .map_err(|e| anyhow!("Failed to send shutdown: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::SignalDirection;
    use crate::storage::InMemoryMetricsStore;
    use chrono::Utc;
    use common::{MarketRegime, MarketSentiment, MarketSnapshot};
    use position_sizing::FixedFractionalSizer;
    use tokio::time::{advance, timeout};

    struct StubIntelligence {
        snapshot: MarketSnapshot,
    }

    #[async_trait::async_trait]
    impl MarketIntelligence for StubIntelligence {
        async fn snapshot(&self) -> Result<MarketSnapshot> {
            Ok(self.snapshot.clone())
        }
    }

    fn snapshot(data_quality: f64) -> MarketSnapshot {
        MarketSnapshot {
            price: Decimal::from(2350),
            volatility: 2.0,
            sentiment: MarketSentiment::StrongBullish,
            regime: MarketRegime::Trending,
            data_quality,
            news_impact: 0.3,
            economic_event_count: 1,
            captured_at: Utc::now(),
        }
    }

    async fn start_engine(
        mode: TradingMode,
        data_quality: f64,
    ) -> (EngineHandle, Arc<InMemoryMetricsStore>) {
        let store = Arc::new(InMemoryMetricsStore::new());
        let config = EngineConfig {
            mode,
            ..EngineConfig::default()
        };
        let (engine, handle) = SignalEngine::new(
            config,
            Arc::new(StubIntelligence {
                snapshot: snapshot(data_quality),
            }),
            Arc::new(FixedFractionalSizer::default()),
            store.clone(),
        )
        .await;
        tokio::spawn(engine.run());
        (handle, store)
    }

    async fn wait_for_live(handle: &EngineHandle, count: usize) -> Vec<Signal> {
        let mut published = handle.subscribe();
        timeout(Duration::from_secs(600), async {
            loop {
                if published.borrow().len() >= count {
                    return published.borrow().clone();
                }
                published.changed().await.unwrap();
            }
        })
        .await
        .expect("engine never published the expected signals")
    }

    #[tokio::test(start_paused = true)]
    async fn pipeline_generates_tracks_and_resolves() {
        let (handle, _store) = start_engine(TradingMode::Aggressive, 0.9).await;
        handle.observe_confluence(0.9).await.unwrap();

        let live = wait_for_live(&handle, 1).await;
        let signal = live[0].clone();
        assert_eq!(signal.direction, SignalDirection::Long);
        assert!(signal.risk_reward_ratio >= Decimal::from_str_exact("1.5").unwrap());
        assert!(signal.position_size > Decimal::ZERO);
        assert_eq!(signal.confidence, 0.9);

        handle.mark_active(signal.id).await.unwrap();
        handle
            .resolve(signal.id, true, Decimal::from(120))
            .await
            .unwrap();

        let metrics = handle.metrics().await.unwrap();
        assert_eq!(metrics.total_signals, 1);
        assert_eq!(metrics.successful_signals, 1);
        assert_eq!(metrics.total_profit, Decimal::from(120));

        // terminal monotonicity: a second resolution is rejected
        let again = handle.resolve(signal.id, false, Decimal::from(-5)).await;
        assert!(again.is_err());
        let metrics = handle.metrics().await.unwrap();
        assert_eq!(metrics.total_signals, 1);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn poor_data_quality_blocks_every_candidate() {
        let (handle, _store) = start_engine(TradingMode::Aggressive, 0.5).await;
        handle.observe_confluence(0.95).await.unwrap();

        // several interval cycles pass without a single accepted signal
        for _ in 0..4 {
            advance(Duration::from_secs(35)).await;
            tokio::task::yield_now().await;
        }

        assert!(handle.live_signals().await.unwrap().is_empty());
        let metrics = handle.metrics().await.unwrap();
        assert_eq!(metrics.total_signals, 0);
        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn god_mode_caps_live_signals_at_two() {
        let (handle, _store) = start_engine(TradingMode::GodMode, 0.9).await;
        handle.observe_confluence(0.96).await.unwrap();

        wait_for_live(&handle, 2).await;

        // further cycles cannot exceed the cap
        for _ in 0..4 {
            advance(Duration::from_secs(35)).await;
            tokio::task::yield_now().await;
        }
        assert_eq!(handle.live_signals().await.unwrap().len(), 2);
        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn below_floor_confluence_generates_nothing() {
        // god mode floor is 0.95; a settled 0.93 never opens a cycle
        let (handle, _store) = start_engine(TradingMode::GodMode, 0.9).await;
        handle.observe_confluence(0.93).await.unwrap();

        for _ in 0..4 {
            advance(Duration::from_secs(35)).await;
            tokio::task::yield_now().await;
        }
        assert!(handle.live_signals().await.unwrap().is_empty());
        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn mode_change_refilters_published_signals() {
        let (handle, _store) = start_engine(TradingMode::Aggressive, 0.9).await;
        handle.observe_confluence(0.82).await.unwrap();

        wait_for_live(&handle, 1).await;

        handle.set_mode(TradingMode::GodMode).await.unwrap();
        assert!(handle.live_signals().await.unwrap().is_empty());
        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_signals_record_no_outcome() {
        let (handle, _store) = start_engine(TradingMode::Aggressive, 0.9).await;
        handle.observe_confluence(0.9).await.unwrap();

        let live = wait_for_live(&handle, 1).await;
        handle.cancel(live[0].id).await.unwrap();

        let metrics = handle.metrics().await.unwrap();
        assert_eq!(metrics.total_signals, 0);

        // cancelled is terminal
        assert!(handle.resolve(live[0].id, true, Decimal::ONE).await.is_err());
        handle.shutdown().await.unwrap();
    }
}
