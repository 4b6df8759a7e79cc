//! Usage accounting and persistence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::core::errors::Result;
use crate::core::models::TokenCounts;
use crate::core::pricing::pricing_for;
use crate::core::store::{KeyValueStore, USAGE_STATS_KEY};

/// Running totals across all translations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    #[serde(default)]
    pub total_translations: u64,
    #[serde(default)]
    pub total_words: u64,
    #[serde(default)]
    pub total_input_tokens: u64,
    #[serde(default)]
    pub total_output_tokens: u64,
    /// Accumulated cost in USD
    #[serde(default)]
    pub total_cost: f64,
    #[serde(default = "Utc::now")]
    pub since: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for UsageStats {
    fn default() -> Self {
        Self {
            total_translations: 0,
            total_words: 0,
            total_input_tokens: 0,
            total_output_tokens: 0,
            total_cost: 0.0,
            since: Utc::now(),
            updated_at: None,
        }
    }
}

impl UsageStats {
    /// Add one successful call. Returns false if the model had no price.
    pub fn record(&mut self, words: u64, tokens: TokenCounts, model: &str) -> bool {
        self.total_translations += 1;
        self.total_words += words;
        self.total_input_tokens += tokens.input_tokens;
        self.total_output_tokens += tokens.output_tokens;
        self.updated_at = Some(Utc::now());

        match pricing_for(model) {
            Some(pricing) => {
                self.total_cost += pricing.cost(tokens);
                true
            }
            None => false,
        }
    }
}

/// Shared usage state bound to a persistent store
#[derive(Clone)]
pub struct UsageTracker {
    stats: Arc<RwLock<UsageStats>>,
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for UsageTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageTracker").finish_non_exhaustive()
    }
}

impl UsageTracker {
    /// Load saved statistics from the store, starting fresh if none exist
    pub fn load(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let stats = match store.get(USAGE_STATS_KEY)? {
            Some(saved) => match serde_json::from_str::<UsageStats>(&saved) {
                Ok(stats) => stats,
                Err(e) => {
                    warn!("Discarding unreadable usage stats: {}", e);
                    UsageStats::default()
                }
            },
            None => UsageStats::default(),
        };

        debug!(
            "Loaded usage stats: {} translations, ${:.4}",
            stats.total_translations, stats.total_cost
        );

        Ok(Self {
            stats: Arc::new(RwLock::new(stats)),
            store,
        })
    }

    /// Record a successful call and persist the full record.
    ///
    /// The write lock is held until the store has been written so that
    /// concurrent callers persist in the same order they update.
    pub async fn record(&self, words: u64, tokens: TokenCounts, model: &str) -> Result<UsageStats> {
        let mut stats = self.stats.write().await;
        if !stats.record(words, tokens, model) {
            warn!("No pricing data for model: {}", model);
        }
        self.persist(&stats)?;

        debug!(
            "Recorded {} words, {} input / {} output tokens on {}",
            words, tokens.input_tokens, tokens.output_tokens, model
        );

        Ok(stats.clone())
    }

    /// Get current usage statistics
    pub async fn get_stats(&self) -> UsageStats {
        self.stats.read().await.clone()
    }

    /// Zero every counter and persist the empty record
    pub async fn reset(&self) -> Result<UsageStats> {
        let mut stats = self.stats.write().await;
        *stats = UsageStats::default();
        self.persist(&stats)?;
        info!("Usage statistics reset");
        Ok(stats.clone())
    }

    fn persist(&self, stats: &UsageStats) -> Result<()> {
        let json = serde_json::to_string(stats)?;
        self.store.set(USAGE_STATS_KEY, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::MemoryStore;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    /// Store whose first write stalls, letting a later write race past it
    struct SlowFirstWrite {
        inner: MemoryStore,
        stalled: AtomicBool,
    }

    impl KeyValueStore for SlowFirstWrite {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            if !self.stalled.swap(true, Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(300));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }
    }

    fn tokens(input: u64, output: u64) -> TokenCounts {
        TokenCounts {
            input_tokens: input,
            output_tokens: output,
        }
    }

    #[tokio::test]
    async fn test_cost_is_sum_of_calls() {
        let tracker = UsageTracker::load(Arc::new(MemoryStore::new())).unwrap();

        tracker.record(3, tokens(1_000, 2_000), "gpt-4.1").await.unwrap();
        tracker.record(5, tokens(4_000, 1_000), "gpt-4o-mini").await.unwrap();
        tracker.record(2, tokens(10, 20), "gpt-5.2").await.unwrap();

        let expected = (1_000.0 / 1e6 * 3.0 + 2_000.0 / 1e6 * 12.0)
            + (4_000.0 / 1e6 * 0.15 + 1_000.0 / 1e6 * 0.6)
            + (10.0 / 1e6 * 20.0 + 20.0 / 1e6 * 80.0);

        let stats = tracker.get_stats().await;
        assert_eq!(stats.total_translations, 3);
        assert_eq!(stats.total_words, 10);
        assert_eq!(stats.total_input_tokens, 5_010);
        assert_eq!(stats.total_output_tokens, 3_020);
        assert!((stats.total_cost - expected).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_unpriced_model_still_counts() {
        let tracker = UsageTracker::load(Arc::new(MemoryStore::new())).unwrap();
        let stats = tracker.record(7, tokens(100, 50), "mystery-model").await.unwrap();

        assert_eq!(stats.total_translations, 1);
        assert_eq!(stats.total_words, 7);
        assert_eq!(stats.total_input_tokens, 100);
        assert_eq!(stats.total_output_tokens, 50);
        assert_eq!(stats.total_cost, 0.0);
    }

    #[tokio::test]
    async fn test_stats_survive_reload() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let tracker = UsageTracker::load(store.clone()).unwrap();
        tracker.record(4, tokens(200, 100), "gpt-4.1").await.unwrap();

        let reloaded = UsageTracker::load(store.clone()).unwrap();
        assert_eq!(reloaded.get_stats().await, tracker.get_stats().await);

        reloaded.reset().await.unwrap();
        let after_reset = UsageTracker::load(store).unwrap().get_stats().await;
        assert_eq!(after_reset.total_translations, 0);
        assert_eq!(after_reset.total_cost, 0.0);
    }

    #[tokio::test]
    async fn test_reads_legacy_record() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store
            .set(
                USAGE_STATS_KEY,
                r#"{"totalTranslations":2,"totalWords":9,"totalInputTokens":40,"totalOutputTokens":30,"totalCost":0.5}"#,
            )
            .unwrap();

        let stats = UsageTracker::load(store).unwrap().get_stats().await;
        assert_eq!(stats.total_translations, 2);
        assert_eq!(stats.total_words, 9);
        assert_eq!(stats.total_cost, 0.5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_records_persist_latest_totals() {
        let store: Arc<dyn KeyValueStore> = Arc::new(SlowFirstWrite {
            inner: MemoryStore::new(),
            stalled: AtomicBool::new(false),
        });
        let tracker = UsageTracker::load(store.clone()).unwrap();

        let first = {
            let tracker = tracker.clone();
            tokio::spawn(async move { tracker.record(1, tokens(10, 10), "gpt-4.1").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = {
            let tracker = tracker.clone();
            tokio::spawn(async move { tracker.record(1, tokens(10, 10), "gpt-4.1").await })
        };
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        assert_eq!(tracker.get_stats().await.total_translations, 2);
        let persisted = UsageTracker::load(store).unwrap().get_stats().await;
        assert_eq!(persisted.total_translations, 2);
    }
}
