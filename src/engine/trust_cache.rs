//! Height→hash trust cache.
//!
//! # Responsibilities
//! - Remember the hash verified at each recently served height
//! - Answer "what do we already trust at height H-1" for linkage checks
//!
//! # Design Decisions
//! - Owned by the engine instance, not global
//! - Bounded: oldest insertions are evicted once `capacity` is reached
//! - Mutex-guarded; requests may be served concurrently by the HTTP layer

use bitcoin::BlockHash;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use crate::observability::metrics;

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<u64, BlockHash>,
    /// Heights in insertion order, oldest first.
    order: VecDeque<u64>,
}

/// Bounded mapping from height to its last verified hash.
#[derive(Debug)]
pub struct TrustCache {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl TrustCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Verified hash at `height`, if one is held.
    pub fn get(&self, height: u64) -> Option<BlockHash> {
        self.lock().entries.get(&height).copied()
    }

    /// Record the verified hash at `height`, replacing any previous one.
    pub fn record(&self, height: u64, hash: BlockHash) {
        let mut inner = self.lock();
        match inner.entries.insert(height, hash) {
            Some(previous) if previous != hash => {
                tracing::info!(
                    height,
                    previous = %previous,
                    current = %hash,
                    "Trusted hash replaced, chain reorganized"
                );
            }
            Some(_) => {}
            None => {
                inner.order.push_back(height);
                while inner.order.len() > self.capacity {
                    if let Some(oldest) = inner.order.pop_front() {
                        inner.entries.remove(&oldest);
                    }
                }
            }
        }
        metrics::record_trust_cache_size(inner.entries.len());
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::hashes::Hash;

    fn hash(n: u8) -> BlockHash {
        BlockHash::from_byte_array([n; 32])
    }

    #[test]
    fn test_record_and_get() {
        let cache = TrustCache::new(10);
        assert!(cache.get(5).is_none());

        cache.record(5, hash(1));
        assert_eq!(cache.get(5), Some(hash(1)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_replacement_keeps_single_entry() {
        let cache = TrustCache::new(10);
        cache.record(5, hash(1));
        cache.record(5, hash(2));
        assert_eq!(cache.get(5), Some(hash(2)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_evicts_oldest_insertions() {
        let cache = TrustCache::new(3);
        for h in 100..105u64 {
            cache.record(h, hash(h as u8));
        }
        assert_eq!(cache.len(), 3);
        assert!(cache.get(100).is_none());
        assert!(cache.get(101).is_none());
        assert_eq!(cache.get(104), Some(hash(104)));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let cache = TrustCache::new(0);
        cache.record(1, hash(1));
        assert_eq!(cache.capacity(), 1);
        assert_eq!(cache.get(1), Some(hash(1)));
    }
}
