//! Content-addressed highlight cache using moka
//!
//! Maps excerpt fingerprints to rendered highlight artifacts for the
//! currently loaded document version.
//!
//! # Guarantees
//!
//! - At most one producer call is in flight per fingerprint; concurrent
//!   callers for the same key await that single call.
//! - Failed producer calls are not cached; the next caller retries.
//! - [`ArtifactCache::invalidate_all`] retires every entry at once.
//!   Producers still in flight for the retired version may finish, but
//!   their result is not visible to lookups made after the invalidation.
//! - Nothing else removes an entry. The store has no size or time bound,
//!   so an excerpt is produced at most once per document version.

use crate::artifact::{CacheEntry, RenderedArtifact};
use crate::fingerprint::Fingerprint;
use moka::future::Cache;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries visible in the current generation
    pub entry_count: u64,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that had to wait for a producer
    pub misses: u64,
    /// Producer calls started
    pub producer_calls: u64,
    /// Producer calls that failed
    pub producer_failures: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    producer_calls: AtomicU64,
    producer_failures: AtomicU64,
}

/// Cache key scoped to one invalidation generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ScopedKey {
    generation: u64,
    fingerprint: Fingerprint,
}

/// Content-addressed artifact cache
///
/// Cheap to clone; clones share storage.
#[derive(Debug, Clone)]
pub struct ArtifactCache {
    inner: Cache<ScopedKey, Arc<CacheEntry>>,
    generation: Arc<AtomicU64>,
    counters: Arc<Counters>,
}

impl ArtifactCache {
    /// Create empty, unbounded cache
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Cache::builder().build(),
            generation: Arc::new(AtomicU64::new(0)),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Return the entry for `fingerprint`, producing it on a miss
    ///
    /// `producer` runs only if no entry exists and no other call for the
    /// same fingerprint is in flight. Otherwise this call attaches to the
    /// existing result.
    ///
    /// # Errors
    /// Returns the producer's error, shared among every caller that was
    /// waiting on that attempt. Nothing is stored on failure.
    pub async fn resolve<F, Fut, E>(
        &self,
        fingerprint: Fingerprint,
        producer: F,
    ) -> Result<Arc<CacheEntry>, Arc<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<RenderedArtifact, E>>,
        E: Send + Sync + 'static,
    {
        let generation = self.generation.load(Ordering::Acquire);
        let key = ScopedKey {
            generation,
            fingerprint,
        };

        if let Some(entry) = self.inner.get(&key).await {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(fingerprint = %fingerprint.short(), "artifact cache hit");
            return Ok(entry);
        }
        self.counters.misses.fetch_add(1, Ordering::Relaxed);

        let counters = &self.counters;
        let init = async move {
            counters.producer_calls.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(fingerprint = %fingerprint.short(), "producing artifact");
            match producer().await {
                Ok(artifact) => Ok(Arc::new(CacheEntry::new(fingerprint, artifact))),
                Err(err) => {
                    counters.producer_failures.fetch_add(1, Ordering::Relaxed);
                    Err(err)
                }
            }
        };

        let entry = self.inner.try_get_with(key, init).await?;

        if self.generation.load(Ordering::Acquire) != generation {
            // invalidated while in flight: hand the result to the waiters
            // but keep it out of the store
            self.inner.invalidate(&key).await;
            tracing::debug!(
                fingerprint = %fingerprint.short(),
                "discarding artifact produced for a retired generation"
            );
        }

        Ok(entry)
    }

    /// Cached entry for `fingerprint`, without producing
    #[inline]
    pub async fn get(&self, fingerprint: &Fingerprint) -> Option<Arc<CacheEntry>> {
        self.inner.get(&self.key(*fingerprint)).await
    }

    /// Check if cache holds `fingerprint`
    #[inline]
    pub async fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.get(fingerprint).await.is_some()
    }

    /// Retire every entry and every in-flight attempt
    pub fn invalidate_all(&self) {
        let retired = self.generation.fetch_add(1, Ordering::AcqRel);
        self.inner.invalidate_all();
        tracing::debug!(retired, "artifact cache invalidated");
    }

    /// Current invalidation generation
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Get cache statistics
    ///
    /// Flushes pending maintenance first so `entry_count` is exact.
    pub async fn stats(&self) -> CacheStats {
        self.inner.run_pending_tasks().await;
        CacheStats {
            entry_count: self.inner.entry_count(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            producer_calls: self.counters.producer_calls.load(Ordering::Relaxed),
            producer_failures: self.counters.producer_failures.load(Ordering::Relaxed),
        }
    }

    fn key(&self, fingerprint: Fingerprint) -> ScopedKey {
        ScopedKey {
            generation: self.generation(),
            fingerprint,
        }
    }
}

impl Default for ArtifactCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[derive(Debug, thiserror::Error)]
    #[error("render failed")]
    struct RenderFailed;

    fn artifact(bytes: &[u8]) -> RenderedArtifact {
        RenderedArtifact::new(bytes.to_vec())
    }

    #[tokio::test]
    async fn resolve_produces_once_then_hits() {
        let cache = ArtifactCache::new();
        let fp = Fingerprint::of_text("compute me");
        let calls = AtomicUsize::new(0);

        let first = cache
            .resolve(fp, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, RenderFailed>(artifact(b"pdf"))
            })
            .await
            .unwrap();

        let second = cache
            .resolve::<_, _, RenderFailed>(fp, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                unreachable!("should use cached value")
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.producer_calls, 1);
        assert_eq!(stats.entry_count, 1);
    }

    #[tokio::test]
    async fn concurrent_resolves_coalesce() {
        let cache = ArtifactCache::new();
        let fp = Fingerprint::of_text("same excerpt");
        let calls = AtomicUsize::new(0);

        let producer = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, RenderFailed>(artifact(b"highlighted"))
        };

        let (a, b) = tokio::join!(cache.resolve(fp, producer), cache.resolve(fp, producer));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(a.artifact().ptr_eq(b.artifact()));
    }

    #[tokio::test]
    async fn failures_are_shared_and_not_cached() {
        let cache = ArtifactCache::new();
        let fp = Fingerprint::of_text("flaky");
        let calls = AtomicUsize::new(0);

        let failing = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            Err::<RenderedArtifact, _>(RenderFailed)
        };
        let (a, b) = tokio::join!(cache.resolve(fp, failing), cache.resolve(fp, failing));
        assert!(a.is_err());
        assert!(b.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!cache.contains(&fp).await);

        let retried = cache
            .resolve(fp, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, RenderFailed>(artifact(b"ok"))
            })
            .await;
        assert!(retried.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().await.producer_failures, 1);
    }

    #[tokio::test]
    async fn invalidate_all_forces_fresh_production() {
        let cache = ArtifactCache::new();
        let fp = Fingerprint::of_text("cached");
        let calls = AtomicUsize::new(0);
        let producer = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, RenderFailed>(artifact(b"v"))
        };

        cache.resolve(fp, producer).await.unwrap();
        assert!(cache.contains(&fp).await);

        cache.invalidate_all();
        assert!(!cache.contains(&fp).await);

        cache.resolve(fp, producer).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn in_flight_result_is_dropped_after_invalidation() {
        let cache = ArtifactCache::new();
        let fp = Fingerprint::of_text("slow");

        let slow = cache.resolve(fp, || async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, RenderFailed>(artifact(b"old version"))
        });
        let invalidate = async {
            tokio::task::yield_now().await;
            cache.invalidate_all();
        };
        let (entry, ()) = tokio::join!(slow, invalidate);

        // the waiter still receives its result
        assert_eq!(entry.unwrap().artifact().bytes(), b"old version");
        // but the retired generation never becomes visible
        assert!(!cache.contains(&fp).await);
        assert_eq!(cache.generation(), 1);
    }

    #[tokio::test]
    async fn entries_survive_many_distinct_excerpts() {
        let cache = ArtifactCache::default();
        let calls = AtomicUsize::new(0);
        let producer = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, RenderFailed>(artifact(b"x"))
        };

        let first = Fingerprint::of_text("excerpt 0");
        cache.resolve(first, producer).await.unwrap();
        for i in 1..1_000 {
            let fp = Fingerprint::of_text(&format!("excerpt {i}"));
            cache.resolve(fp, producer).await.unwrap();
            cache.resolve(fp, producer).await.unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1_000);

        cache.resolve(first, producer).await.unwrap();
        let stats = cache.stats().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1_000);
        assert_eq!(stats.producer_calls, 1_000);
        assert_eq!(stats.entry_count, 1_000);
    }
}
