//! Decoded image cache with LRU eviction
//!
//! Shared by the worker lanes and the consumer. Entries are keyed by the
//! file path together with its modification time, so an edited preview is
//! decoded again instead of served stale.

pub mod metrics;

use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Instant, UNIX_EPOCH};
use xxhash_rust::xxh3::Xxh3;

use crate::codec::{self, CodecError, DecodedImage};
pub use metrics::{CacheMetrics, CacheMetricsHandle};

struct CachedImage {
    image: Arc<DecodedImage>,
    size: usize,
}

/// Memory-bounded cache of decoded images
pub struct ImageCache {
    images: RwLock<HashMap<u64, CachedImage>>,
    lru: RwLock<VecDeque<u64>>,
    max_memory: usize,
    current_memory: AtomicUsize,
    metrics: CacheMetricsHandle,
}

impl std::fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCache")
            .field("entries", &self.len())
            .field("memory_usage", &self.memory_usage())
            .field("max_memory", &self.max_memory)
            .finish()
    }
}

impl ImageCache {
    /// Creates a cache that keeps at most `max_memory` bytes of pixels
    pub fn new(max_memory: usize) -> Self {
        Self {
            images: RwLock::new(HashMap::new()),
            lru: RwLock::new(VecDeque::new()),
            max_memory,
            current_memory: AtomicUsize::new(0),
            metrics: CacheMetricsHandle::new(),
        }
    }

    /// Gets an image from cache or decodes it if not present
    pub fn get_or_decode<P: AsRef<Path>>(&self, path: P) -> Result<Arc<DecodedImage>, CodecError> {
        let path = path.as_ref();
        let key = Self::hash_path(path);

        if let Some(image) = self.lookup(key) {
            self.metrics.record_cache_hit();
            return Ok(image);
        }
        self.metrics.record_cache_miss();

        let start = Instant::now();
        let image = codec::decode(path)?;
        let size = image.byte_size();

        let path_str = path.to_string_lossy().to_string();
        self.metrics.record_decode_time(path_str.clone(), start.elapsed());
        self.metrics.record_decoded_bytes(path_str, size);
        log::debug!(
            "Decoded {} ({}x{}, {size} bytes)",
            path.display(),
            image.dimensions().0,
            image.dimensions().1
        );

        let image = Arc::new(image);
        self.insert(key, Arc::clone(&image), size);
        Ok(image)
    }

    /// Whether `path` at its current modification time is cached
    pub fn contains<P: AsRef<Path>>(&self, path: P) -> bool {
        self.images.read().contains_key(&Self::hash_path(path.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.images.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.read().is_empty()
    }

    /// Clears all cached images
    pub fn clear(&self) {
        self.images.write().clear();
        self.lru.write().clear();
        self.current_memory.store(0, Ordering::SeqCst);
    }

    /// Gets the current memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        self.current_memory.load(Ordering::Relaxed)
    }

    pub fn max_memory(&self) -> usize {
        self.max_memory
    }

    pub fn metrics(&self) -> &CacheMetricsHandle {
        &self.metrics
    }

    fn lookup(&self, key: u64) -> Option<Arc<DecodedImage>> {
        let images = self.images.read();
        let cached = images.get(&key)?;

        let mut lru = self.lru.write();
        if let Some(pos) = lru.iter().position(|&id| id == key) {
            lru.remove(pos);
        }
        lru.push_back(key);
        Some(Arc::clone(&cached.image))
    }

    fn insert(&self, key: u64, image: Arc<DecodedImage>, size: usize) {
        let mut images = self.images.write();
        let mut lru = self.lru.write();

        // Another lane may have decoded the same file meanwhile
        if let Some(previous) = images.remove(&key) {
            self.current_memory.fetch_sub(previous.size, Ordering::SeqCst);
            if let Some(pos) = lru.iter().position(|&id| id == key) {
                lru.remove(pos);
            }
        }

        let mut current = self.current_memory.load(Ordering::SeqCst);
        while current + size > self.max_memory {
            let Some(oldest) = lru.pop_front() else {
                break;
            };
            if let Some(removed) = images.remove(&oldest) {
                current -= removed.size;
                self.metrics.record_eviction();
            }
        }

        images.insert(key, CachedImage { image, size });
        lru.push_back(key);
        self.current_memory.store(current + size, Ordering::SeqCst);
    }

    fn hash_path(path: &Path) -> u64 {
        let mut hasher = Xxh3::new();
        path.hash(&mut hasher);

        if let Ok(modified) = std::fs::metadata(path).and_then(|m| m.modified()) {
            if let Ok(duration) = modified.duration_since(UNIX_EPOCH) {
                duration.as_secs().hash(&mut hasher);
                duration.subsec_nanos().hash(&mut hasher);
            }
        }

        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(path: &Path, width: u32, height: u32) {
        image::RgbaImage::from_pixel(width, height, image::Rgba([1, 2, 3, 255]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_cache_creation() {
        let cache = ImageCache::new(100 * 1024 * 1024);
        assert_eq!(cache.memory_usage(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_second_lookup_hits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        write_png(&path, 4, 4);

        let cache = ImageCache::new(1024 * 1024);
        let first = cache.get_or_decode(&path).unwrap();
        let second = cache.get_or_decode(&path).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.metrics().cache_misses(), 1);
        assert_eq!(cache.metrics().cache_hits(), 1);
        assert_eq!(cache.memory_usage(), 4 * 4 * 4);
        assert!(cache.contains(&path));
    }

    #[test]
    fn test_eviction_respects_budget() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        write_png(&a, 4, 4);
        write_png(&b, 4, 4);

        // Room for exactly one 64-byte image
        let cache = ImageCache::new(64);
        cache.get_or_decode(&a).unwrap();
        cache.get_or_decode(&b).unwrap();

        assert_eq!(cache.len(), 1);
        assert!(!cache.contains(&a));
        assert!(cache.contains(&b));
        assert_eq!(cache.memory_usage(), 64);
        assert_eq!(cache.metrics().evictions(), 1);
    }

    #[test]
    fn test_decode_errors_are_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();

        let cache = ImageCache::new(1024);
        assert!(cache.get_or_decode(&path).is_err());
        assert!(cache.is_empty());
        assert_eq!(cache.memory_usage(), 0);
    }

    #[test]
    fn test_cache_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        write_png(&path, 2, 2);

        let cache = ImageCache::new(1024);
        cache.get_or_decode(&path).unwrap();
        cache.clear();
        assert_eq!(cache.memory_usage(), 0);
        assert!(cache.is_empty());
    }
}
