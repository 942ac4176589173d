// Quality Gate
// Acceptance criteria between signal construction and lifecycle tracking

use crate::signals::{Signal, SignalDirection, SignalStatus};
use common::MarketSnapshot;
use rust_decimal::Decimal;
use tracing::debug;

/// Why a candidate was rejected. `CapacityReached` is raised by the ledger
/// rather than the gate but shares the taxonomy.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalRejection {
    ConfidenceBelowFloor { confidence: f64, floor: f64 },
    RiskRewardTooLow { ratio: Decimal, minimum: Decimal },
    NonPositiveSize { size: Decimal },
    ConflictingExposure { pending: SignalDirection },
    PoorDataQuality { quality: f64, minimum: f64 },
    CapacityReached { live: usize, limit: usize },
}

impl std::fmt::Display for SignalRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalRejection::ConfidenceBelowFloor { confidence, floor } => {
                write!(f, "Confidence {:.2} below floor {:.2}", confidence, floor)
            }
            SignalRejection::RiskRewardTooLow { ratio, minimum } => {
                write!(f, "Risk:reward {} below minimum {}", ratio, minimum)
            }
            SignalRejection::NonPositiveSize { size } => {
                write!(f, "Position size {} is not positive", size)
            }
            SignalRejection::ConflictingExposure { pending } => {
                write!(f, "Opposite {} signal already pending", pending)
            }
            SignalRejection::PoorDataQuality { quality, minimum } => {
                write!(f, "Data quality {:.2} at or below minimum {:.2}", quality, minimum)
            }
            SignalRejection::CapacityReached { live, limit } => {
                write!(f, "Live signal count {} at mode limit {}", live, limit)
            }
        }
    }
}

impl std::error::Error for SignalRejection {}

/// Configuration for the quality gate. The confidence floor is global and
/// independent of the trading mode.
#[derive(Debug, Clone)]
pub struct QualityGateConfig {
    pub min_confidence: f64,
    pub min_risk_reward: Decimal,
    pub min_data_quality: f64,
}

impl Default for QualityGateConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.80,
            min_risk_reward: Decimal::from_str_exact("1.5").unwrap(),
            min_data_quality: 0.6,
        }
    }
}

/// Multi-criteria acceptance check. All checks are pure; the first failure
/// rejects the candidate outright.
#[derive(Debug, Clone, Default)]
pub struct QualityGate {
    config: QualityGateConfig,
}

impl QualityGate {
    pub fn new(config: QualityGateConfig) -> Self {
        Self { config }
    }

    pub fn check(
        &self,
        candidate: &Signal,
        live_signals: &[Signal],
        snapshot: &MarketSnapshot,
    ) -> Result<(), SignalRejection> {
        if candidate.confidence < self.config.min_confidence {
            return Err(SignalRejection::ConfidenceBelowFloor {
                confidence: candidate.confidence,
                floor: self.config.min_confidence,
            });
        }

        if candidate.risk_reward_ratio < self.config.min_risk_reward {
            return Err(SignalRejection::RiskRewardTooLow {
                ratio: candidate.risk_reward_ratio,
                minimum: self.config.min_risk_reward,
            });
        }

        if candidate.position_size <= Decimal::ZERO {
            return Err(SignalRejection::NonPositiveSize {
                size: candidate.position_size,
            });
        }

        let conflicting = live_signals.iter().any(|s| {
            s.status == SignalStatus::Pending && s.direction != candidate.direction
        });
        if conflicting {
            return Err(SignalRejection::ConflictingExposure {
                pending: candidate.direction.opposite(),
            });
        }

        if snapshot.data_quality <= self.config.min_data_quality {
            return Err(SignalRejection::PoorDataQuality {
                quality: snapshot.data_quality,
                minimum: self.config.min_data_quality,
            });
        }

        debug!(signal = %candidate.id, "candidate passed quality gate");
        Ok(())
    }
}
