//! Short-lived cache for public catalog reads.
//!
//! Every mutation calls [`ReadCache::invalidate_all`], so a successful write is
//! visible to the next read. A fetch that started before an invalidation is
//! not stored, which keeps a slow read from re-populating stale data.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache;

use crate::models::{MerchantApplication, ReviewWithMerchant, Rock};

/// Cache key for list reads.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum ReadKey {
    Rocks { greenlisted_only: bool },
    Merchants { approved_only: bool },
    Reviews,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum ReadValue {
    Rocks(Arc<Vec<Rock>>),
    Merchants(Arc<Vec<MerchantApplication>>),
    Reviews(Arc<Vec<ReviewWithMerchant>>),
}

/// Token returned by [`ReadCache::generation`]; pass it back to
/// [`ReadCache::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

/// Cache of list reads keyed by [`ReadKey`].
#[derive(Clone)]
pub struct ReadCache {
    cache: Option<Cache<ReadKey, ReadValue>>,
    generation: Arc<AtomicU64>,
}

impl ReadCache {
    /// Create a cache whose entries live for `ttl`.
    ///
    /// A zero `ttl` disables caching.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let cache = (!ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(64)
                .time_to_live(ttl)
                .build()
        });

        Self {
            cache,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn get(&self, key: ReadKey) -> Option<ReadValue> {
        match &self.cache {
            Some(cache) => cache.get(&key).await,
            None => None,
        }
    }

    /// Snapshot taken before fetching from the store.
    #[must_use]
    pub fn generation(&self) -> Generation {
        Generation(self.generation.load(Ordering::Acquire))
    }

    /// Store a fetched value unless an invalidation happened since `seen`.
    pub async fn insert(&self, seen: Generation, key: ReadKey, value: ReadValue) {
        if let Some(cache) = &self.cache
            && self.generation() == seen
        {
            cache.insert(key, value).await;
        }
    }

    /// Drop every cached read.
    pub fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
        }
    }
}

impl std::fmt::Debug for ReadCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadCache")
            .field("enabled", &self.cache.is_some())
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_then_get() {
        let cache = ReadCache::new(Duration::from_secs(60));
        let key = ReadKey::Rocks {
            greenlisted_only: true,
        };

        let seen = cache.generation();
        cache
            .insert(seen, key, ReadValue::Rocks(Arc::new(Vec::new())))
            .await;

        assert!(matches!(cache.get(key).await, Some(ReadValue::Rocks(_))));
        assert!(
            cache
                .get(ReadKey::Rocks {
                    greenlisted_only: false
                })
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_invalidate_clears_entries() {
        let cache = ReadCache::new(Duration::from_secs(60));
        let seen = cache.generation();
        cache
            .insert(seen, ReadKey::Reviews, ReadValue::Reviews(Arc::new(Vec::new())))
            .await;

        cache.invalidate_all();

        assert!(cache.get(ReadKey::Reviews).await.is_none());
    }

    #[tokio::test]
    async fn test_stale_fetch_is_not_stored() {
        let cache = ReadCache::new(Duration::from_secs(60));
        let seen = cache.generation();

        // a write lands while the read is in flight
        cache.invalidate_all();
        cache
            .insert(seen, ReadKey::Reviews, ReadValue::Reviews(Arc::new(Vec::new())))
            .await;

        assert!(cache.get(ReadKey::Reviews).await.is_none());
    }

    #[tokio::test]
    async fn test_zero_ttl_disables_caching() {
        let cache = ReadCache::new(Duration::ZERO);
        let seen = cache.generation();
        cache
            .insert(seen, ReadKey::Reviews, ReadValue::Reviews(Arc::new(Vec::new())))
            .await;

        assert!(cache.get(ReadKey::Reviews).await.is_none());
    }
}
