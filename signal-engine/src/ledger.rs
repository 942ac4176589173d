// Signal Ledger
// Single owner of tracked signals: capacity enforcement, status
// transitions, the retroactive mode filter, and the bounded history ring

use crate::config::TradingMode;
use crate::gate::SignalRejection;
use crate::signals::{Signal, SignalPriority, SignalStatus};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use tracing::{debug, info};
use uuid::Uuid;

/// Failure modes for lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    NotFound(Uuid),
    AlreadyTerminal { id: Uuid, status: SignalStatus },
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::NotFound(id) => write!(f, "Signal {} is not tracked", id),
            ResolveError::AlreadyTerminal { id, status } => {
                write!(f, "Signal {} already terminal ({:?})", id, status)
            }
        }
    }
}

impl std::error::Error for ResolveError {}

/// Authoritative collection of tracked signals. Mutated only by the engine
/// actor, so it needs no interior locking.
pub struct SignalLedger {
    mode: TradingMode,
    live: Vec<Signal>,
    history: VecDeque<Signal>,
    history_capacity: usize,
}

impl SignalLedger {
    pub fn new(mode: TradingMode, history_capacity: usize) -> Self {
        Self {
            mode,
            live: Vec::new(),
            history: VecDeque::with_capacity(history_capacity),
            history_capacity,
        }
    }

    pub fn mode(&self) -> TradingMode {
        self.mode
    }

    /// Number of tracked signals counting against the mode cap.
    pub fn open_count(&self) -> usize {
        self.live.len()
    }

    /// Track an accepted candidate. Rejects with a capacity error when the
    /// mode's daily cap is already filled.
    pub fn submit(&mut self, signal: Signal) -> Result<Uuid, SignalRejection> {
        let limit = self.mode.max_signals_per_day();
        if self.live.len() >= limit {
            return Err(SignalRejection::CapacityReached {
                live: self.live.len(),
                limit,
            });
        }

        let id = signal.id;
        self.push_history(signal.clone());
        self.live.push(signal);
        info!(signal = %id, open = self.live.len(), "signal tracked");
        Ok(id)
    }

    /// Close a signal with its realized outcome. Terminal states are final;
    /// resolving an unknown or terminal id never mutates anything.
    pub fn resolve(&mut self, id: Uuid, success: bool, profit: Decimal) -> Result<Signal, ResolveError> {
        let signal = self.retire(id, SignalStatus::Closed)?;
        info!(signal = %id, success, %profit, "signal closed");
        Ok(signal)
    }

    /// Cancel a signal. Terminal, no outcome recorded.
    pub fn cancel(&mut self, id: Uuid) -> Result<Signal, ResolveError> {
        let signal = self.retire(id, SignalStatus::Cancelled)?;
        info!(signal = %id, "signal cancelled");
        Ok(signal)
    }

    /// Mark a pending signal as executing. Idempotent for already-active
    /// signals.
    pub fn activate(&mut self, id: Uuid) -> Result<(), ResolveError> {
        match self.live.iter_mut().find(|s| s.id == id) {
            Some(signal) if signal.status == SignalStatus::Pending => {
                signal.status = SignalStatus::Active;
                Self::sync_history(&mut self.history, id, SignalStatus::Active);
                info!(signal = %id, "signal active");
                Ok(())
            }
            Some(signal) => {
                debug!(signal = %id, status = ?signal.status, "activate was a no-op");
                Ok(())
            }
            None => Err(self.missing(id)),
        }
    }

    /// Switch trading mode and retroactively drop live signals below the new
    /// confidence floor. Dropped signals keep their history entries.
    pub fn set_mode(&mut self, mode: TradingMode) -> usize {
        self.mode = mode;
        let floor = mode.min_confidence();
        let before = self.live.len();
        self.live.retain(|s| s.confidence >= floor);
        let dropped = before - self.live.len();
        if dropped > 0 {
            info!(?mode, dropped, "mode change filtered live signals");
        }
        dropped
    }

    pub fn live_signals(&self) -> &[Signal] {
        &self.live
    }

    pub fn pending_signals(&self) -> Vec<Signal> {
        self.live
            .iter()
            .filter(|s| s.status == SignalStatus::Pending)
            .cloned()
            .collect()
    }

    pub fn signals_by_priority(&self, priority: SignalPriority) -> Vec<Signal> {
        self.live
            .iter()
            .filter(|s| s.priority == priority)
            .cloned()
            .collect()
    }

    /// Most-recent-first bounded history of every tracked signal.
    pub fn history(&self) -> impl Iterator<Item = &Signal> {
        self.history.iter().rev()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    fn retire(&mut self, id: Uuid, status: SignalStatus) -> Result<Signal, ResolveError> {
        let index = match self.live.iter().position(|s| s.id == id) {
            Some(index) => index,
            None => return Err(self.missing(id)),
        };

        let mut signal = self.live.remove(index);
        signal.status = status;
        Self::sync_history(&mut self.history, id, status);
        Ok(signal)
    }

    fn missing(&self, id: Uuid) -> ResolveError {
        match self.history.iter().find(|s| s.id == id) {
            Some(entry) if entry.is_terminal() => ResolveError::AlreadyTerminal {
                id,
                status: entry.status,
            },
            _ => ResolveError::NotFound(id),
        }
    }

    fn push_history(&mut self, signal: Signal) {
        if self.history.len() >= self.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(signal);
    }

    fn sync_history(history: &mut VecDeque<Signal>, id: Uuid, status: SignalStatus) {
        if let Some(entry) = history.iter_mut().rev().find(|s| s.id == id) {
            entry.status = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::SignalDirection;
    use crate::strategies::Strategy;
    use chrono::Utc;

    fn signal(confidence: f64) -> Signal {
        Signal {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            strategy: Strategy::SmartMoneyConviction,
            direction: SignalDirection::Long,
            entry_price: Decimal::from(2350),
            stop_loss: Decimal::from(2338),
            take_profit: Decimal::from(2386),
            confidence,
            risk_reward_ratio: Decimal::from(3),
            position_size: Decimal::from(5),
            reasoning: "test".to_string(),
            confluence_factors: vec![],
            timeframe: "1H-4H".to_string(),
            priority: SignalPriority::from_confidence(confidence),
            status: SignalStatus::Pending,
            expected_duration_secs: 14_400,
        }
    }

    #[test]
    fn submit_enforces_mode_cap() {
        let mut ledger = SignalLedger::new(TradingMode::GodMode, 100);
        ledger.submit(signal(0.96)).unwrap();
        ledger.submit(signal(0.97)).unwrap();

        let result = ledger.submit(signal(0.98));
        assert!(matches!(
            result,
            Err(SignalRejection::CapacityReached { live: 2, limit: 2 })
        ));
        assert_eq!(ledger.open_count(), 2);
    }

    #[test]
    fn resolve_retires_and_reports_outcome() {
        let mut ledger = SignalLedger::new(TradingMode::Balanced, 100);
        let id = ledger.submit(signal(0.9)).unwrap();

        let closed = ledger.resolve(id, true, Decimal::from(120)).unwrap();
        assert_eq!(closed.status, SignalStatus::Closed);
        assert_eq!(ledger.open_count(), 0);

        // the history entry reflects the terminal status
        let entry = ledger.history().find(|s| s.id == id).unwrap();
        assert_eq!(entry.status, SignalStatus::Closed);
    }

    #[test]
    fn terminal_states_are_final() {
        let mut ledger = SignalLedger::new(TradingMode::Balanced, 100);
        let id = ledger.submit(signal(0.9)).unwrap();
        ledger.resolve(id, false, Decimal::from(-40)).unwrap();

        let again = ledger.resolve(id, true, Decimal::from(10));
        assert_eq!(
            again,
            Err(ResolveError::AlreadyTerminal {
                id,
                status: SignalStatus::Closed
            })
        );

        let cancel = ledger.cancel(id);
        assert!(matches!(cancel, Err(ResolveError::AlreadyTerminal { .. })));
    }

    #[test]
    fn unknown_id_is_not_found() {
        let mut ledger = SignalLedger::new(TradingMode::Balanced, 100);
        let missing = Uuid::new_v4();
        assert_eq!(
            ledger.resolve(missing, true, Decimal::ZERO),
            Err(ResolveError::NotFound(missing))
        );
    }

    #[test]
    fn activate_moves_pending_to_active_once() {
        let mut ledger = SignalLedger::new(TradingMode::Balanced, 100);
        let id = ledger.submit(signal(0.9)).unwrap();

        ledger.activate(id).unwrap();
        assert_eq!(ledger.live_signals()[0].status, SignalStatus::Active);

        // idempotent second call
        ledger.activate(id).unwrap();
        assert_eq!(ledger.live_signals()[0].status, SignalStatus::Active);

        // active signals still resolve
        ledger.resolve(id, true, Decimal::from(55)).unwrap();
        assert_eq!(ledger.open_count(), 0);
    }

    #[test]
    fn cancel_is_terminal_without_outcome() {
        let mut ledger = SignalLedger::new(TradingMode::Balanced, 100);
        let id = ledger.submit(signal(0.9)).unwrap();

        let cancelled = ledger.cancel(id).unwrap();
        assert_eq!(cancelled.status, SignalStatus::Cancelled);
        assert_eq!(ledger.open_count(), 0);
        assert!(matches!(
            ledger.resolve(id, true, Decimal::ZERO),
            Err(ResolveError::AlreadyTerminal { .. })
        ));
    }

    #[test]
    fn mode_change_filters_live_but_keeps_history() {
        let mut ledger = SignalLedger::new(TradingMode::Aggressive, 100);
        let low = ledger.submit(signal(0.82)).unwrap();
        let high = ledger.submit(signal(0.96)).unwrap();

        let dropped = ledger.set_mode(TradingMode::GodMode);
        assert_eq!(dropped, 1);
        assert_eq!(ledger.open_count(), 1);
        assert_eq!(ledger.live_signals()[0].id, high);

        // the dropped signal stays in history and can no longer be resolved
        assert!(ledger.history().any(|s| s.id == low));
        assert_eq!(
            ledger.resolve(low, true, Decimal::ZERO),
            Err(ResolveError::NotFound(low))
        );
    }

    #[test]
    fn history_ring_evicts_oldest() {
        let mut ledger = SignalLedger::new(TradingMode::Aggressive, 3);
        let first = ledger.submit(signal(0.9)).unwrap();
        for _ in 0..3 {
            let id = ledger.submit(signal(0.9)).unwrap();
            // keep the live set under the cap
            ledger.resolve(id, true, Decimal::ONE).unwrap();
        }

        assert_eq!(ledger.history_len(), 3);
        assert!(!ledger.history().any(|s| s.id == first));
    }

    #[test]
    fn queries_slice_the_live_set() {
        let mut ledger = SignalLedger::new(TradingMode::Aggressive, 100);
        let pending = ledger.submit(signal(0.92)).unwrap();
        let active = ledger.submit(signal(0.83)).unwrap();
        ledger.activate(active).unwrap();

        let pending_only = ledger.pending_signals();
        assert_eq!(pending_only.len(), 1);
        assert_eq!(pending_only[0].id, pending);

        // 0.92 -> Critical, 0.83 -> Medium
        let critical = ledger.signals_by_priority(SignalPriority::Critical);
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].id, pending);
        assert!(ledger.signals_by_priority(SignalPriority::GodMode).is_empty());
    }

    #[test]
    fn history_is_most_recent_first() {
        let mut ledger = SignalLedger::new(TradingMode::Aggressive, 100);
        let a = ledger.submit(signal(0.9)).unwrap();
        let b = ledger.submit(signal(0.9)).unwrap();

        let order: Vec<Uuid> = ledger.history().map(|s| s.id).collect();
        assert_eq!(order, vec![b, a]);
    }
}
