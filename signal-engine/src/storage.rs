// Metrics Storage
// Durable key-value boundary for performance metrics across restarts

use anyhow::{Context, Result};
use common::PerformanceMetrics;
use std::collections::HashMap;
use std::path::PathBuf;

/// Fixed identifier under which the engine's metrics are persisted.
pub const METRICS_KEY: &str = "performance_metrics";

/// Trait for metrics storage backends
#[async_trait::async_trait]
pub trait MetricsStore: Send + Sync {
    /// Persist a metrics snapshot under the given key
    async fn save(&self, key: &str, metrics: &PerformanceMetrics) -> Result<()>;

    /// Load the metrics snapshot for the key, if one was ever saved
    async fn load(&self, key: &str) -> Result<Option<PerformanceMetrics>>;
}

/// In-memory metrics storage (for testing and development)
pub struct InMemoryMetricsStore {
    entries: tokio::sync::RwLock<HashMap<String, PerformanceMetrics>>,
}

impl InMemoryMetricsStore {
    pub fn new() -> Self {
        Self {
            entries: tokio::sync::RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryMetricsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MetricsStore for InMemoryMetricsStore {
    async fn save(&self, key: &str, metrics: &PerformanceMetrics) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), metrics.clone());
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<PerformanceMetrics>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }
}

/// JSON-file metrics storage: one `<key>.json` document per key under a
/// directory.
pub struct JsonFileMetricsStore {
    dir: PathBuf,
}

impl JsonFileMetricsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait::async_trait]
impl MetricsStore for JsonFileMetricsStore {
    async fn save(&self, key: &str, metrics: &PerformanceMetrics) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create metrics dir {:?}", self.dir))?;
        let payload = serde_json::to_vec_pretty(metrics).context("Failed to encode metrics")?;
        let path = self.path_for(key);
        tokio::fs::write(&path, payload)
            .await
            .with_context(|| format!("Failed to write metrics to {:?}", path))?;
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<PerformanceMetrics>> {
        let path = self.path_for(key);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read metrics from {:?}", path))
            }
        };
        let metrics =
            serde_json::from_slice(&raw).with_context(|| format!("Corrupt metrics in {:?}", path))?;
        Ok(Some(metrics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn metrics() -> PerformanceMetrics {
        PerformanceMetrics {
            total_signals: 7,
            successful_signals: 5,
            total_profit: Decimal::new(31550, 2),
            consecutive_wins: 3,
            max_consecutive_wins: 4,
        }
    }

    #[tokio::test]
    async fn in_memory_round_trip() {
        let store = InMemoryMetricsStore::new();
        assert!(store.load(METRICS_KEY).await.unwrap().is_none());

        store.save(METRICS_KEY, &metrics()).await.unwrap();
        let loaded = store.load(METRICS_KEY).await.unwrap().unwrap();
        assert_eq!(loaded, metrics());
    }

    #[tokio::test]
    async fn file_store_round_trip() {
        let dir = std::env::temp_dir().join(format!("metrics-{}", uuid::Uuid::new_v4()));
        let store = JsonFileMetricsStore::new(&dir);

        assert!(store.load(METRICS_KEY).await.unwrap().is_none());

        store.save(METRICS_KEY, &metrics()).await.unwrap();
        let loaded = store.load(METRICS_KEY).await.unwrap().unwrap();
        assert_eq!(loaded, metrics());

        // persisting then reloading is the identity
        store.save(METRICS_KEY, &loaded).await.unwrap();
        assert_eq!(store.load(METRICS_KEY).await.unwrap().unwrap(), loaded);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
