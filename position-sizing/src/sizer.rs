// Fixed-Fractional Sizer
// Risks a configured fraction of the account per trade, weighted by signal
// confidence and normalized by stop distance

use anyhow::Result;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Boundary to the risk engine. Given account balance, entry/stop geometry,
/// and confidence, returns the position size in units. Implementations must
/// never return a negative size; a zero size marks the trade as unsizable.
#[async_trait::async_trait]
pub trait PositionSizer: Send + Sync {
    async fn position_size(
        &self,
        balance: Decimal,
        entry_price: Decimal,
        stop_loss: Decimal,
        confidence: f64,
    ) -> Result<Decimal>;
}

/// Configuration for the fixed-fractional sizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizerConfig {
    /// Fraction of the account risked per trade at full confidence
    pub risk_fraction: Decimal,
    /// Hard cap on the risked fraction after confidence weighting
    pub max_fraction: Decimal,
}

impl Default for SizerConfig {
    fn default() -> Self {
        Self {
            risk_fraction: Decimal::from_str_exact("0.01").unwrap(), // 1%
            max_fraction: Decimal::from_str_exact("0.05").unwrap(),  // 5%
        }
    }
}

/// Fixed-fractional position sizer. The risked amount scales linearly with
/// confidence; the position size is the risked amount divided by the stop
/// distance, so wider stops produce smaller positions.
#[derive(Debug, Clone)]
pub struct FixedFractionalSizer {
    config: SizerConfig,
}

impl FixedFractionalSizer {
    pub fn new(config: SizerConfig) -> Self {
        Self { config }
    }
}

impl Default for FixedFractionalSizer {
    fn default() -> Self {
        Self::new(SizerConfig::default())
    }
}

#[async_trait::async_trait]
impl PositionSizer for FixedFractionalSizer {
    async fn position_size(
        &self,
        balance: Decimal,
        entry_price: Decimal,
        stop_loss: Decimal,
        confidence: f64,
    ) -> Result<Decimal> {
        let stop_distance = (entry_price - stop_loss).abs();
        if stop_distance.is_zero() || balance <= Decimal::ZERO {
            debug!(
                %balance, %entry_price, %stop_loss,
                "degenerate sizing input, sizing to zero"
            );
            return Ok(Decimal::ZERO);
        }

        let weight = Decimal::from_f64(confidence.clamp(0.0, 1.0)).unwrap_or(Decimal::ZERO);
        let fraction = (self.config.risk_fraction * weight).min(self.config.max_fraction);
        let risk_amount = balance * fraction;
        let size = risk_amount / stop_distance;

        debug!(%fraction, %risk_amount, %size, "position sized");
        Ok(size.max(Decimal::ZERO))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn size_scales_with_confidence() {
        let sizer = FixedFractionalSizer::default();
        let balance = Decimal::from(100_000);
        let entry = Decimal::from(2350);
        let stop = Decimal::from(2340);

        let full = sizer.position_size(balance, entry, stop, 1.0).await.unwrap();
        let half = sizer.position_size(balance, entry, stop, 0.5).await.unwrap();

        // 1% of 100k at full confidence over a 10-point stop = 100 units
        assert_eq!(full, Decimal::from(100));
        assert_eq!(half, Decimal::from(50));
    }

    #[tokio::test]
    async fn wider_stop_shrinks_position() {
        let sizer = FixedFractionalSizer::default();
        let balance = Decimal::from(100_000);
        let entry = Decimal::from(2350);

        let tight = sizer
            .position_size(balance, entry, Decimal::from(2345), 0.9)
            .await
            .unwrap();
        let wide = sizer
            .position_size(balance, entry, Decimal::from(2330), 0.9)
            .await
            .unwrap();
        assert!(tight > wide);
    }

    #[tokio::test]
    async fn degenerate_stop_sizes_to_zero() {
        let sizer = FixedFractionalSizer::default();
        let entry = Decimal::from(2350);

        let size = sizer
            .position_size(Decimal::from(100_000), entry, entry, 0.9)
            .await
            .unwrap();
        assert_eq!(size, Decimal::ZERO);
    }

    #[tokio::test]
    async fn out_of_range_confidence_is_clamped() {
        let sizer = FixedFractionalSizer::default();
        let balance = Decimal::from(100_000);
        let entry = Decimal::from(2350);
        let stop = Decimal::from(2340);

        let over = sizer.position_size(balance, entry, stop, 1.7).await.unwrap();
        let full = sizer.position_size(balance, entry, stop, 1.0).await.unwrap();
        assert_eq!(over, full);

        let under = sizer.position_size(balance, entry, stop, -0.3).await.unwrap();
        assert_eq!(under, Decimal::ZERO);
    }
}
