// Signal Data Model
// The fully-specified candidate/tracked trade signal and its enumerations

use crate::strategies::Strategy;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trade direction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SignalDirection {
    Long,
    Short,
}

impl SignalDirection {
    pub fn opposite(&self) -> SignalDirection {
        match self {
            SignalDirection::Long => SignalDirection::Short,
            SignalDirection::Short => SignalDirection::Long,
        }
    }
}

impl std::fmt::Display for SignalDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalDirection::Long => write!(f, "LONG"),
            SignalDirection::Short => write!(f, "SHORT"),
        }
    }
}

/// Urgency class, a step function of confidence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum SignalPriority {
    Low,
    Medium,
    High,
    Critical,
    GodMode,
}

impl SignalPriority {
    pub fn from_confidence(confidence: f64) -> Self {
        match confidence {
            c if c >= 0.95 => SignalPriority::GodMode,
            c if c >= 0.90 => SignalPriority::Critical,
            c if c >= 0.85 => SignalPriority::High,
            c if c >= 0.80 => SignalPriority::Medium,
            _ => SignalPriority::Low,
        }
    }
}

/// Lifecycle state. `Pending` on acceptance; `Closed` and `Cancelled` are
/// terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SignalStatus {
    Pending,
    Active,
    Closed,
    Cancelled,
}

/// A fully-specified trade signal. Every field except `status` is fixed at
/// construction; the ledger owns all status transitions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Signal {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub strategy: Strategy,
    pub direction: SignalDirection,
    pub entry_price: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub confidence: f64,
    pub risk_reward_ratio: Decimal,
    pub position_size: Decimal,
    pub reasoning: String,
    pub confluence_factors: Vec<String>,
    pub timeframe: String,
    pub priority: SignalPriority,
    pub status: SignalStatus,
    pub expected_duration_secs: u64,
}

impl Signal {
    pub fn is_open(&self) -> bool {
        matches!(self.status, SignalStatus::Pending | SignalStatus::Active)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, SignalStatus::Closed | SignalStatus::Cancelled)
    }

    /// Profit at the target, in account currency.
    pub fn potential_profit(&self) -> Decimal {
        (self.take_profit - self.entry_price).abs() * self.position_size
    }

    /// Loss at the stop, in account currency.
    pub fn potential_loss(&self) -> Decimal {
        (self.entry_price - self.stop_loss).abs() * self.position_size
    }
}
