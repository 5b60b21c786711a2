use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use ethers::types::Address;
use lru::LruCache;

use crate::models::Video;

/// chain id, contract, video id
pub type CacheKey = (u64, Address, u64);

/// Short-lived snapshots of viewer-independent video records, so repeated page
/// loads don't hit the RPC node. Bounded: the least recently used entry goes first.
pub struct VideoCache {
    ttl: Duration,
    entries: Mutex<LruCache<CacheKey, (Instant, Video)>>,
}

impl VideoCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);

        VideoCache {
            ttl,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn entries(&self) -> MutexGuard<'_, LruCache<CacheKey, (Instant, Video)>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Video> {
        let mut entries = self.entries();

        match entries.get(key) {
            Some((cached_at, video)) if cached_at.elapsed() <= self.ttl => return Some(video.clone()),
            Some(_) => {}
            None => return None,
        }

        entries.pop(key);
        None
    }

    pub fn insert(&self, key: CacheKey, video: Video) {
        if self.ttl.is_zero() {
            return;
        }
        self.entries().put(key, (Instant::now(), video));
    }

    /// Drops every snapshot, e.g. once a transaction that changes contract state confirms.
    pub fn clear(&self) {
        self.entries().clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries().len()
    }
}
