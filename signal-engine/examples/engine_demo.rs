// Signal Engine Demo
// Wires the engine to a canned intelligence provider, feeds a confluence
// burst, and prints the published signals and metrics

use chrono::Utc;
use common::{MarketIntelligence, MarketRegime, MarketSentiment, MarketSnapshot};
use position_sizing::FixedFractionalSizer;
use rust_decimal::Decimal;
use signal_engine::{EngineConfig, InMemoryMetricsStore, SignalEngine, TradingMode};
use std::sync::Arc;

struct CannedIntelligence;

#[async_trait::async_trait]
impl MarketIntelligence for CannedIntelligence {
    async fn snapshot(&self) -> anyhow::Result<MarketSnapshot> {
        Ok(MarketSnapshot {
            price: Decimal::from(2362),
            volatility: 1.8,
            sentiment: MarketSentiment::StrongBullish,
            regime: MarketRegime::Breakout,
            data_quality: 0.92,
            news_impact: 0.75,
            economic_event_count: 3,
            captured_at: Utc::now(),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = EngineConfig {
        mode: TradingMode::Aggressive,
        ..EngineConfig::default()
    };

    let (engine, handle) = SignalEngine::new(
        config,
        Arc::new(CannedIntelligence),
        Arc::new(FixedFractionalSizer::default()),
        Arc::new(InMemoryMetricsStore::new()),
    )
    .await;

    let runner = tokio::spawn(engine.run());
    let mut published = handle.subscribe();

    // Simulate the external confluence stream spiking
    handle.observe_confluence(0.91).await?;

    // Wait for the debounced trigger to produce a signal
    loop {
        published.changed().await?;
        if !published.borrow().is_empty() {
            break;
        }
    }

    let signals = published.borrow().clone();
    for signal in &signals {
        println!(
            "{} {} @ {} | stop {} | target {} | RR {} | size {} | {:?}",
            signal.strategy,
            signal.direction,
            signal.entry_price,
            signal.stop_loss,
            signal.take_profit,
            signal.risk_reward_ratio,
            signal.position_size,
            signal.priority,
        );
        println!("  {}", signal.reasoning);
    }

    // Report an outcome and show the updated metrics
    handle
        .resolve(signals[0].id, true, Decimal::from(145))
        .await?;
    let metrics = handle.metrics().await?;
    println!(
        "signals: {} | win rate: {:.1}% | streak: {} | profit: {}",
        metrics.total_signals,
        metrics.win_rate() * 100.0,
        metrics.consecutive_wins,
        metrics.total_profit,
    );

    handle.shutdown().await?;
    let _ = runner.await;
    Ok(())
}
