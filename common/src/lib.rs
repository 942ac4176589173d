// Shared Domain Types
// Market-state snapshots, provider boundaries, and performance metrics
// consumed by the signal engine crates

pub mod market;
pub mod metrics;

pub use market::{MarketIntelligence, MarketRegime, MarketSentiment, MarketSnapshot};
pub use metrics::PerformanceMetrics;
