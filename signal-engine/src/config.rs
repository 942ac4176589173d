// Engine Configuration
// Operator-set trading mode, risk appetite, and scheduler tuning

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Trading mode. Sets the confidence floor for generation and the cap on
/// simultaneously tracked signals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TradingMode {
    Conservative,
    Balanced,
    Aggressive,
    GodMode,
}

impl TradingMode {
    /// Minimum confluence/confidence required to generate in this mode.
    pub fn min_confidence(&self) -> f64 {
        match self {
            TradingMode::Conservative => 0.90,
            TradingMode::Balanced => 0.85,
            TradingMode::Aggressive => 0.80,
            TradingMode::GodMode => 0.95,
        }
    }

    /// Cap on tracked live signals.
    pub fn max_signals_per_day(&self) -> usize {
        match self {
            TradingMode::Conservative => 3,
            TradingMode::Balanced => 5,
            TradingMode::Aggressive => 8,
            TradingMode::GodMode => 2,
        }
    }
}

/// Operator risk appetite. Scales every position size the builder produces.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn position_size_multiplier(&self) -> Decimal {
        match self {
            RiskLevel::Low => Decimal::from_str_exact("0.5").unwrap(),
            RiskLevel::Moderate => Decimal::ONE,
            RiskLevel::High => Decimal::from_str_exact("1.5").unwrap(),
        }
    }
}

/// Configuration for the signal engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Trading mode active at startup
    #[serde(default = "default_mode")]
    pub mode: TradingMode,
    /// Risk appetite active at startup
    #[serde(default = "default_risk_level")]
    pub risk_level: RiskLevel,
    /// Account balance handed to the position sizer
    #[serde(default = "default_account_balance")]
    pub account_balance: Decimal,
    /// Fixed generation interval in seconds
    #[serde(default = "default_cycle_interval_secs")]
    pub cycle_interval_secs: u64,
    /// Quiet window for the reactive confluence trigger, in seconds
    #[serde(default = "default_debounce_secs")]
    pub debounce_secs: u64,
    /// Budget for the scorer fan-out within one cycle, in seconds
    #[serde(default = "default_scorer_timeout_secs")]
    pub scorer_timeout_secs: u64,
    /// Bound on the retained signal history ring
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            risk_level: default_risk_level(),
            account_balance: default_account_balance(),
            cycle_interval_secs: default_cycle_interval_secs(),
            debounce_secs: default_debounce_secs(),
            scorer_timeout_secs: default_scorer_timeout_secs(),
            history_capacity: default_history_capacity(),
        }
    }
}

fn default_mode() -> TradingMode {
    TradingMode::Conservative
}

fn default_risk_level() -> RiskLevel {
    RiskLevel::Moderate
}

fn default_account_balance() -> Decimal {
    Decimal::from(100_000)
}

fn default_cycle_interval_secs() -> u64 {
    30
}

fn default_debounce_secs() -> u64 {
    2
}

fn default_scorer_timeout_secs() -> u64 {
    5
}

fn default_history_capacity() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_thresholds() {
        assert_eq!(TradingMode::Conservative.min_confidence(), 0.90);
        assert_eq!(TradingMode::Balanced.min_confidence(), 0.85);
        assert_eq!(TradingMode::Aggressive.min_confidence(), 0.80);
        assert_eq!(TradingMode::GodMode.min_confidence(), 0.95);

        assert_eq!(TradingMode::Conservative.max_signals_per_day(), 3);
        assert_eq!(TradingMode::Balanced.max_signals_per_day(), 5);
        assert_eq!(TradingMode::Aggressive.max_signals_per_day(), 8);
        assert_eq!(TradingMode::GodMode.max_signals_per_day(), 2);
    }

    #[test]
    fn risk_multipliers() {
        assert_eq!(
            RiskLevel::Low.position_size_multiplier(),
            Decimal::from_str_exact("0.5").unwrap()
        );
        assert_eq!(RiskLevel::Moderate.position_size_multiplier(), Decimal::ONE);
        assert_eq!(
            RiskLevel::High.position_size_multiplier(),
            Decimal::from_str_exact("1.5").unwrap()
        );
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.mode, TradingMode::Conservative);
        assert_eq!(config.cycle_interval_secs, 30);
        assert_eq!(config.debounce_secs, 2);
        assert_eq!(config.history_capacity, 100);
        assert_eq!(config.account_balance, Decimal::from(100_000));
    }
}
