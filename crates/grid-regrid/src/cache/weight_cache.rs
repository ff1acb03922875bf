//! Compute-once cache of regridding weights.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;
use wx_common::WxResult;

use crate::types::{CacheStats, WeightKey};
use crate::weights::RegridWeights;

type Slot = Arc<Mutex<Option<Arc<RegridWeights>>>>;

/// Weight cache shared by regridders.
///
/// Each key owns its own slot so that concurrent requests for the same
/// uncomputed signature wait for a single computation while requests for
/// other signatures proceed. A failed computation leaves the slot empty and
/// the next caller retries.
#[derive(Default)]
pub struct WeightCache {
    slots: Mutex<HashMap<WeightKey, Slot>>,
    hits: AtomicU64,
    misses: AtomicU64,
    computations: AtomicU64,
}

impl WeightCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return cached weights for `key`, computing them with `compute` on
    /// the first request.
    pub fn get_or_compute<F>(&self, key: &WeightKey, compute: F) -> WxResult<Arc<RegridWeights>>
    where
        F: FnOnce() -> WxResult<RegridWeights>,
    {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(*key).or_default())
        };

        let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(weights) = guard.as_ref() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(weights));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(method = %key.method, source = ?key.source.shape(), target = ?key.target.shape(), "Weight cache miss");

        let weights = Arc::new(compute()?);
        self.computations.fetch_add(1, Ordering::Relaxed);
        *guard = Some(Arc::clone(&weights));
        Ok(weights)
    }

    /// Cached weights for `key`, without computing.
    pub fn get(&self, key: &WeightKey) -> Option<Arc<RegridWeights>> {
        let slot = {
            let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.get(key).cloned()?
        };
        let guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        guard.clone()
    }

    /// Check if weights for a key have been computed.
    pub fn contains(&self, key: &WeightKey) -> bool {
        self.get(key).is_some()
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            computations: self.computations.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    /// Number of computed entries. Waits on slots that are being computed.
    pub fn len(&self) -> usize {
        let slots: Vec<Slot> = {
            let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.values().cloned().collect()
        };
        slots
            .iter()
            .filter(|slot| slot.lock().unwrap_or_else(PoisonError::into_inner).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all entries from the cache.
    pub fn clear(&self) {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl std::fmt::Debug for WeightCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeightCache")
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RegridMethod;
    use crate::weights::build_weights;
    use std::sync::atomic::AtomicUsize;
    use wx_common::{GeoGrid, WxError};

    fn key(method: RegridMethod) -> (WeightKey, GeoGrid) {
        let grid = GeoGrid::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0]).unwrap();
        (WeightKey::new(method, &grid, &grid, false), grid)
    }

    #[test]
    fn test_compute_once() {
        let cache = WeightCache::new();
        let (k, grid) = key(RegridMethod::Bilinear);
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            cache
                .get_or_compute(&k, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    build_weights(RegridMethod::Bilinear, &grid, &grid, false)
                })
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.computations, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_failed_compute_leaves_slot_empty() {
        let cache = WeightCache::new();
        let (k, grid) = key(RegridMethod::Bilinear);

        let err = cache.get_or_compute(&k, || Err(WxError::GridMismatch("boom".into())));
        assert!(err.is_err());
        assert!(!cache.contains(&k));

        cache
            .get_or_compute(&k, || build_weights(RegridMethod::Bilinear, &grid, &grid, false))
            .unwrap();
        assert!(cache.contains(&k));
        assert_eq!(cache.stats().computations, 1);
    }

    #[test]
    fn test_concurrent_callers_compute_once() {
        let cache = WeightCache::new();
        let (k, grid) = key(RegridMethod::Conservative);
        let calls = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    cache
                        .get_or_compute(&k, || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            std::thread::sleep(std::time::Duration::from_millis(20));
                            build_weights(RegridMethod::Conservative, &grid, &grid, false)
                        })
                        .unwrap();
                });
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().hits, 7);
    }

    #[test]
    fn test_len_stable_under_concurrent_reads() {
        let cache = WeightCache::new();
        let (k, grid) = key(RegridMethod::Bilinear);
        cache
            .get_or_compute(&k, || build_weights(RegridMethod::Bilinear, &grid, &grid, false))
            .unwrap();

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..500 {
                        assert!(cache.get(&k).is_some());
                    }
                });
            }
            for _ in 0..500 {
                assert_eq!(cache.stats().entries, 1);
            }
        });
    }

    #[test]
    fn test_clear() {
        let cache = WeightCache::new();
        let (k, grid) = key(RegridMethod::NearestS2d);
        cache
            .get_or_compute(&k, || build_weights(RegridMethod::NearestS2d, &grid, &grid, false))
            .unwrap();
        assert!(!cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());
    }
}
