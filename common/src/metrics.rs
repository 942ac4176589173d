use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Rolling performance aggregate for the signal engine. Mutated only by the
/// performance tracker; everything else reads a snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PerformanceMetrics {
    pub total_signals: u64,
    pub successful_signals: u64,
    pub total_profit: Decimal,
    pub consecutive_wins: u32,
    pub max_consecutive_wins: u32,
}

impl PerformanceMetrics {
    /// Fraction of resolved signals that closed successfully. Zero until the
    /// first signal resolves.
    pub fn win_rate(&self) -> f64 {
        if self.total_signals == 0 {
            return 0.0;
        }
        self.successful_signals as f64 / self.total_signals as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn win_rate_handles_empty() {
        assert_eq!(PerformanceMetrics::default().win_rate(), 0.0);
    }

    #[test]
    fn win_rate_is_ratio() {
        let metrics = PerformanceMetrics {
            total_signals: 8,
            successful_signals: 6,
            total_profit: Decimal::from(420),
            consecutive_wins: 2,
            max_consecutive_wins: 4,
        };
        assert!((metrics.win_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn serde_round_trip_is_identity() {
        let metrics = PerformanceMetrics {
            total_signals: 12,
            successful_signals: 9,
            total_profit: Decimal::new(-12345, 2),
            consecutive_wins: 0,
            max_consecutive_wins: 5,
        };
        let json = serde_json::to_string(&metrics).unwrap();
        let parsed: PerformanceMetrics = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, metrics);
    }
}
