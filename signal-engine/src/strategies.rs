// Strategy Catalog
// Eight scoring strategies, each a deterministic function of the market
// snapshot, plus the per-strategy trade-shaping constants

use anyhow::Result;
use common::{MarketRegime, MarketSentiment, MarketSnapshot};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Strategy identifier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Strategy {
    InstitutionalOrderFlow,
    SmartMoneyConviction,
    LiquidityHunting,
    NewsImpactScalping,
    SentimentReversal,
    BreakoutConfirmation,
    MeanReversionPro,
    VolatilityExpansion,
}

/// Declaration order doubles as the tie-break order during selection.
pub const STRATEGY_CATALOG: [Strategy; 8] = [
    Strategy::InstitutionalOrderFlow,
    Strategy::SmartMoneyConviction,
    Strategy::LiquidityHunting,
    Strategy::NewsImpactScalping,
    Strategy::SentimentReversal,
    Strategy::BreakoutConfirmation,
    Strategy::MeanReversionPro,
    Strategy::VolatilityExpansion,
];

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::InstitutionalOrderFlow => "Institutional Order Flow",
            Strategy::SmartMoneyConviction => "Smart Money Conviction",
            Strategy::LiquidityHunting => "Liquidity Hunting",
            Strategy::NewsImpactScalping => "News Impact Scalping",
            Strategy::SentimentReversal => "Sentiment Reversal",
            Strategy::BreakoutConfirmation => "Breakout Confirmation",
            Strategy::MeanReversionPro => "Mean Reversion Pro",
            Strategy::VolatilityExpansion => "Volatility Expansion",
        }
    }

    /// Multiplier applied to the volatility-derived base stop distance.
    /// Tighter for scalping and hunting, wider for conviction plays.
    pub fn stop_multiplier(&self) -> Decimal {
        match self {
            Strategy::LiquidityHunting => Decimal::from_str_exact("0.6").unwrap(),
            Strategy::NewsImpactScalping => Decimal::from_str_exact("0.8").unwrap(),
            Strategy::SmartMoneyConviction | Strategy::InstitutionalOrderFlow => {
                Decimal::from_str_exact("1.2").unwrap()
            }
            _ => Decimal::ONE,
        }
    }

    /// Target distance as a multiple of the stop distance. Always at least
    /// 2.0, so the risk:reward ratio holds by construction.
    pub fn target_multiplier(&self) -> Decimal {
        match self {
            Strategy::NewsImpactScalping => Decimal::from_str_exact("2.0").unwrap(),
            Strategy::BreakoutConfirmation => Decimal::from_str_exact("2.5").unwrap(),
            Strategy::SmartMoneyConviction => Decimal::from_str_exact("3.0").unwrap(),
            Strategy::LiquidityHunting => Decimal::from_str_exact("4.0").unwrap(),
            _ => Decimal::from_str_exact("2.5").unwrap(),
        }
    }

    pub fn timeframe(&self) -> &'static str {
        match self {
            Strategy::NewsImpactScalping | Strategy::LiquidityHunting => "1M-5M",
            Strategy::SmartMoneyConviction | Strategy::InstitutionalOrderFlow => "1H-4H",
            _ => "15M-1H",
        }
    }

    pub fn expected_duration_secs(&self) -> u64 {
        match self {
            Strategy::NewsImpactScalping => 300,
            Strategy::LiquidityHunting => 900,
            Strategy::SmartMoneyConviction => 14_400,
            _ => 3_600,
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Scoring strategy. Stateless; each call scores one snapshot in [0, 1].
#[async_trait::async_trait]
pub trait StrategyScorer: Send + Sync {
    fn strategy(&self) -> Strategy;
    async fn score(&self, snapshot: &MarketSnapshot) -> Result<f64>;
}

/// Sentiment-anchored oscillator in [0, 100]. News impact pushes the index
/// further in the sentiment's direction. Serves as the overbought/oversold
/// indicator for reversal and mean-reversion logic.
pub fn momentum_index(snapshot: &MarketSnapshot) -> f64 {
    let base = match snapshot.sentiment {
        MarketSentiment::StrongBullish => 80.0,
        MarketSentiment::Bullish => 65.0,
        MarketSentiment::Neutral => 50.0,
        MarketSentiment::Bearish => 35.0,
        MarketSentiment::StrongBearish => 20.0,
    };
    let push = snapshot.news_impact.clamp(0.0, 1.0) * 10.0;
    let shifted = if snapshot.sentiment.is_bullish() {
        base + push
    } else if snapshot.sentiment == MarketSentiment::Neutral {
        base
    } else {
        base - push
    };
    shifted.clamp(0.0, 100.0)
}

/// Distance from the price to the nearest multiple of 25, the round levels
/// where resting liquidity clusters.
pub fn round_level_distance(price: Decimal) -> Decimal {
    let step = Decimal::from(25);
    let level = (price / step).round() * step;
    (price - level).abs()
}

fn near_round_level(snapshot: &MarketSnapshot) -> bool {
    round_level_distance(snapshot.price) < Decimal::from(15)
}

/// Follows large institutional money movements.
#[derive(Debug, Default)]
pub struct InstitutionalOrderFlowScorer;

#[async_trait::async_trait]
impl StrategyScorer for InstitutionalOrderFlowScorer {
    fn strategy(&self) -> Strategy {
        Strategy::InstitutionalOrderFlow
    }

    async fn score(&self, snapshot: &MarketSnapshot) -> Result<f64> {
        let mut score: f64 = 0.0;
        if snapshot.data_quality > 0.75 {
            score += 0.3;
        }
        if snapshot.sentiment.is_extreme() {
            score += 0.4;
        }
        if matches!(
            snapshot.regime,
            MarketRegime::Trending | MarketRegime::Breakout
        ) {
            score += 0.3;
        }
        Ok(score.min(1.0))
    }
}

/// High-conviction trades backed by clean data and a decisive market.
#[derive(Debug, Default)]
pub struct SmartMoneyConvictionScorer;

#[async_trait::async_trait]
impl StrategyScorer for SmartMoneyConvictionScorer {
    fn strategy(&self) -> Strategy {
        Strategy::SmartMoneyConviction
    }

    async fn score(&self, snapshot: &MarketSnapshot) -> Result<f64> {
        let mut score: f64 = 0.0;
        if snapshot.data_quality > 0.85 {
            score += 0.4;
        }
        if snapshot.sentiment.is_extreme() && snapshot.data_quality > 0.8 {
            score += 0.4;
        }
        if matches!(
            snapshot.regime,
            MarketRegime::Trending | MarketRegime::Breakout
        ) {
            score += 0.2;
        }
        Ok(score.min(1.0))
    }
}

/// Targets stop-hunting sweeps around round levels.
#[derive(Debug, Default)]
pub struct LiquidityHuntingScorer;

#[async_trait::async_trait]
impl StrategyScorer for LiquidityHuntingScorer {
    fn strategy(&self) -> Strategy {
        Strategy::LiquidityHunting
    }

    async fn score(&self, snapshot: &MarketSnapshot) -> Result<f64> {
        let mut score: f64 = 0.0;
        if near_round_level(snapshot) {
            score += 0.5;
        }
        if snapshot.volatility > 1.0 && snapshot.volatility < 3.0 {
            score += 0.3;
        }
        if snapshot.regime == MarketRegime::Ranging {
            score += 0.2;
        }
        Ok(score.min(1.0))
    }
}

/// Scalps news-driven volatility spikes.
#[derive(Debug, Default)]
pub struct NewsImpactScalpingScorer;

#[async_trait::async_trait]
impl StrategyScorer for NewsImpactScalpingScorer {
    fn strategy(&self) -> Strategy {
        Strategy::NewsImpactScalping
    }

    async fn score(&self, snapshot: &MarketSnapshot) -> Result<f64> {
        let mut score: f64 = 0.0;
        if snapshot.news_impact > 0.7 {
            score += 0.5;
        }
        if snapshot.economic_event_count > 2 {
            score += 0.3;
        }
        if snapshot.volatility > 0.8 && snapshot.volatility < 2.5 {
            score += 0.2;
        }
        Ok(score.min(1.0))
    }
}

/// Contrarian plays against crowded extremes.
#[derive(Debug, Default)]
pub struct SentimentReversalScorer;

#[async_trait::async_trait]
impl StrategyScorer for SentimentReversalScorer {
    fn strategy(&self) -> Strategy {
        Strategy::SentimentReversal
    }

    async fn score(&self, snapshot: &MarketSnapshot) -> Result<f64> {
        let mut score: f64 = 0.0;
        if snapshot.sentiment.is_extreme() {
            score += 0.4;
        }
        if snapshot.news_impact > 0.6 {
            score += 0.3;
        }
        let index = momentum_index(snapshot);
        if index >= 75.0 || index <= 25.0 {
            score += 0.3;
        }
        Ok(score.min(1.0))
    }
}

/// Trades confirmed breakouts with momentum behind them.
#[derive(Debug, Default)]
pub struct BreakoutConfirmationScorer;

#[async_trait::async_trait]
impl StrategyScorer for BreakoutConfirmationScorer {
    fn strategy(&self) -> Strategy {
        Strategy::BreakoutConfirmation
    }

    async fn score(&self, snapshot: &MarketSnapshot) -> Result<f64> {
        let mut score: f64 = 0.0;
        if snapshot.regime == MarketRegime::Breakout {
            score += 0.4;
        }
        if snapshot.volatility >= 1.2 {
            score += 0.3;
        }
        if near_round_level(snapshot) {
            score += 0.3;
        }
        Ok(score.min(1.0))
    }
}

/// Fades stretched moves inside a range.
#[derive(Debug, Default)]
pub struct MeanReversionProScorer;

#[async_trait::async_trait]
impl StrategyScorer for MeanReversionProScorer {
    fn strategy(&self) -> Strategy {
        Strategy::MeanReversionPro
    }

    async fn score(&self, snapshot: &MarketSnapshot) -> Result<f64> {
        let mut score: f64 = 0.0;
        if snapshot.regime == MarketRegime::Ranging {
            score += 0.4;
        }
        let index = momentum_index(snapshot);
        if index >= 70.0 || index <= 30.0 {
            score += 0.4;
        }
        if snapshot.news_impact < 0.4 {
            score += 0.2;
        }
        Ok(score.min(1.0))
    }
}

/// Captures regime shifts into expanding volatility.
#[derive(Debug, Default)]
pub struct VolatilityExpansionScorer;

#[async_trait::async_trait]
impl StrategyScorer for VolatilityExpansionScorer {
    fn strategy(&self) -> Strategy {
        Strategy::VolatilityExpansion
    }

    async fn score(&self, snapshot: &MarketSnapshot) -> Result<f64> {
        let mut score: f64 = 0.0;
        if snapshot.volatility >= 1.3 {
            score += 0.4;
        }
        if snapshot.economic_event_count > 1 {
            score += 0.3;
        }
        if matches!(
            snapshot.regime,
            MarketRegime::Volatile | MarketRegime::Breakout
        ) {
            score += 0.3;
        }
        Ok(score.min(1.0))
    }
}

/// The full scorer catalog in tie-break order.
pub fn catalog() -> Vec<Arc<dyn StrategyScorer>> {
    vec![
        Arc::new(InstitutionalOrderFlowScorer),
        Arc::new(SmartMoneyConvictionScorer),
        Arc::new(LiquidityHuntingScorer),
        Arc::new(NewsImpactScalpingScorer),
        Arc::new(SentimentReversalScorer),
        Arc::new(BreakoutConfirmationScorer),
        Arc::new(MeanReversionProScorer),
        Arc::new(VolatilityExpansionScorer),
    ]
}
