use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sentiment classification supplied by the market intelligence provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MarketSentiment {
    StrongBullish,
    Bullish,
    Neutral,
    Bearish,
    StrongBearish,
}

impl MarketSentiment {
    /// True for the bullish side of the scale.
    pub fn is_bullish(&self) -> bool {
        matches!(self, MarketSentiment::StrongBullish | MarketSentiment::Bullish)
    }

    /// True at either extreme of the scale.
    pub fn is_extreme(&self) -> bool {
        matches!(
            self,
            MarketSentiment::StrongBullish | MarketSentiment::StrongBearish
        )
    }
}

impl std::fmt::Display for MarketSentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MarketSentiment::StrongBullish => "Strong Bullish",
            MarketSentiment::Bullish => "Bullish",
            MarketSentiment::Neutral => "Neutral",
            MarketSentiment::Bearish => "Bearish",
            MarketSentiment::StrongBearish => "Strong Bearish",
        };
        write!(f, "{}", label)
    }
}

/// Regime classification supplied by the market intelligence provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MarketRegime {
    Trending,
    Ranging,
    Breakout,
    Volatile,
}

impl std::fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MarketRegime::Trending => "Trending",
            MarketRegime::Ranging => "Ranging",
            MarketRegime::Breakout => "Breakout",
            MarketRegime::Volatile => "Volatile",
        };
        write!(f, "{}", label)
    }
}

/// Read-only market-state snapshot. Immutable for the duration of one
/// evaluation cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub price: Decimal,
    /// Realized volatility in price units (not a percentage).
    pub volatility: f64,
    pub sentiment: MarketSentiment,
    pub regime: MarketRegime,
    /// Feed quality score in [0, 1].
    pub data_quality: f64,
    /// News impact score in [0, 1].
    pub news_impact: f64,
    /// Number of scheduled economic events in the current session.
    pub economic_event_count: u32,
    pub captured_at: DateTime<Utc>,
}

/// Boundary to the external market intelligence provider. The engine pulls
/// one snapshot per generation cycle.
#[async_trait::async_trait]
pub trait MarketIntelligence: Send + Sync {
    async fn snapshot(&self) -> anyhow::Result<MarketSnapshot>;
}
