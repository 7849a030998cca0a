use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Counters for image decoding and cache behavior
#[derive(Debug, Default)]
pub struct CacheMetrics {
    decode_times: RwLock<HashMap<String, Duration>>,
    decode_counts: RwLock<HashMap<String, u64>>,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    evictions: AtomicU64,
    decoded_bytes: AtomicU64,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record how long the last decode of `path` took
    pub fn record_decode_time(&self, path: String, duration: Duration) {
        self.decode_times.write().insert(path, duration);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the pixel bytes produced by one decode of `path`
    pub fn record_decoded_bytes(&self, path: String, bytes: usize) {
        self.decoded_bytes.fetch_add(bytes as u64, Ordering::Relaxed);
        *self.decode_counts.write().entry(path).or_insert(0) += 1;
    }

    /// Cache hit rate as a percentage
    pub fn cache_hit_rate(&self) -> f32 {
        let hits = self.cache_hits.load(Ordering::Relaxed) as f32;
        let misses = self.cache_misses.load(Ordering::Relaxed) as f32;

        if hits + misses > 0.0 {
            hits / (hits + misses) * 100.0
        } else {
            0.0
        }
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> u64 {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Total pixel bytes produced by decodes, including evicted images
    pub fn total_decoded_bytes(&self) -> u64 {
        self.decoded_bytes.load(Ordering::Relaxed)
    }

    pub fn last_decode_time(&self, path: &str) -> Option<Duration> {
        self.decode_times.read().get(path).cloned()
    }

    pub fn decode_count(&self, path: &str) -> u64 {
        *self.decode_counts.read().get(path).unwrap_or(&0)
    }
}

/// A cloneable shared handle to [`CacheMetrics`]
#[derive(Debug, Clone, Default)]
pub struct CacheMetricsHandle(Arc<CacheMetrics>);

impl CacheMetricsHandle {
    pub fn new() -> Self {
        Self(Arc::new(CacheMetrics::new()))
    }
}

impl std::ops::Deref for CacheMetricsHandle {
    type Target = CacheMetrics;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
