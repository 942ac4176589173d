// Signal Builder
// Turns the selected strategy plus the snapshot into a fully-specified
// candidate: direction, stop/target geometry, size, and priority

use crate::config::RiskLevel;
use crate::signals::{Signal, SignalDirection, SignalPriority, SignalStatus};
use crate::strategies::{momentum_index, Strategy};
use anyhow::Result;
use chrono::Utc;
use common::MarketSnapshot;
use position_sizing::PositionSizer;
use rust_decimal::prelude::*;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Builds candidate signals. Stops scale with volatility, targets scale with
/// the strategy's stop distance, and sizing is delegated to the risk engine.
pub struct SignalBuilder {
    sizer: Arc<dyn PositionSizer>,
    account_balance: Decimal,
}

impl SignalBuilder {
    pub fn new(sizer: Arc<dyn PositionSizer>, account_balance: Decimal) -> Self {
        Self {
            sizer,
            account_balance,
        }
    }

    pub async fn build(
        &self,
        strategy: Strategy,
        snapshot: &MarketSnapshot,
        confidence: f64,
        risk_level: RiskLevel,
    ) -> Result<Signal> {
        let direction = direction_for(strategy, snapshot);

        let stop_distance = stop_distance(strategy, snapshot.volatility);
        let target_distance = stop_distance * strategy.target_multiplier();

        let entry_price = snapshot.price;
        let (stop_loss, take_profit) = match direction {
            SignalDirection::Long => (entry_price - stop_distance, entry_price + target_distance),
            SignalDirection::Short => (entry_price + stop_distance, entry_price - target_distance),
        };

        // Fixed at construction; never recomputed for the signal's lifetime.
        let risk_reward_ratio = target_distance / stop_distance;

        let base_size = self
            .sizer
            .position_size(self.account_balance, entry_price, stop_loss, confidence)
            .await?;
        let position_size = base_size * risk_level.position_size_multiplier();

        let signal = Signal {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            strategy,
            direction,
            entry_price,
            stop_loss,
            take_profit,
            confidence,
            risk_reward_ratio,
            position_size,
            reasoning: format!(
                "{} | Confluence: {:.0}% | Sentiment: {} | Regime: {}",
                strategy.name(),
                confidence * 100.0,
                snapshot.sentiment,
                snapshot.regime
            ),
            confluence_factors: vec![
                format!("Sentiment: {}", snapshot.sentiment),
                format!("Regime: {}", snapshot.regime),
                format!("Data quality: {:.0}%", snapshot.data_quality * 100.0),
            ],
            timeframe: strategy.timeframe().to_string(),
            priority: SignalPriority::from_confidence(confidence),
            status: SignalStatus::Pending,
            expected_duration_secs: strategy.expected_duration_secs(),
        };

        debug!(
            signal = %signal.id, %strategy, %direction,
            rr = %signal.risk_reward_ratio, size = %signal.position_size,
            "built candidate signal"
        );
        Ok(signal)
    }
}

/// Stop distance in price units: a volatility floor of 10 scaled by the
/// strategy's stop multiplier.
fn stop_distance(strategy: Strategy, volatility: f64) -> Decimal {
    let volatility = Decimal::from_f64(volatility.max(0.0)).unwrap_or(Decimal::ZERO);
    let base = (volatility * Decimal::from(5)).max(Decimal::from(10));
    base * strategy.stop_multiplier()
}

fn follow_sentiment(snapshot: &MarketSnapshot) -> SignalDirection {
    if snapshot.sentiment.is_bullish() {
        SignalDirection::Long
    } else {
        SignalDirection::Short
    }
}

/// Direction rule per strategy family. Strategies without a bespoke rule
/// follow sentiment; that fallback is deliberate, not derived.
fn direction_for(strategy: Strategy, snapshot: &MarketSnapshot) -> SignalDirection {
    use common::MarketSentiment;

    match strategy {
        Strategy::InstitutionalOrderFlow
        | Strategy::SmartMoneyConviction
        | Strategy::BreakoutConfirmation => follow_sentiment(snapshot),
        Strategy::SentimentReversal => {
            if snapshot.sentiment == MarketSentiment::StrongBullish {
                SignalDirection::Short
            } else {
                SignalDirection::Long
            }
        }
        Strategy::MeanReversionPro => {
            let index = momentum_index(snapshot);
            if index >= 70.0 {
                SignalDirection::Short
            } else if index <= 30.0 {
                SignalDirection::Long
            } else {
                follow_sentiment(snapshot)
            }
        }
        _ => follow_sentiment(snapshot),
    }
}
