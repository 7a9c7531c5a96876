// ── Resource cache ──
//
// Keyed, in-memory memoization of backend reads. Concurrent reads of the
// same key share one pending fetch; invalidation marks entries stale
// without evicting their payload; every commit or invalidation bumps a
// version counter that views can watch.

mod key;

use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use futures_core::Stream;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, trace, warn};

use crate::error::CoreError;

pub use key::{CacheKey, KeyPredicate, ResourceKind};

type Payload = Arc<dyn Any + Send + Sync>;
type SharedFetch = Shared<BoxFuture<'static, Result<Payload, CoreError>>>;

const RETRY_DELAY: Duration = Duration::from_millis(200);

/// A cached value together with its freshness.
#[derive(Debug)]
pub struct Cached<T> {
    pub value: Arc<T>,
    /// `true` when invalidated (or expired) and not yet refetched. The
    /// value is still the last one successfully fetched.
    pub stale: bool,
}

impl<T> Clone for Cached<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            stale: self.stale,
        }
    }
}

#[derive(Default)]
struct Entry {
    value: Option<Payload>,
    fetched_at: Option<Instant>,
    stale: bool,
    /// Bumped on every invalidation. A fetch started in an older epoch
    /// cannot make the entry fresh.
    epoch: u64,
    in_flight: Option<SharedFetch>,
}

impl Entry {
    fn is_fresh(&self, max_age: Option<Duration>) -> bool {
        self.value.is_some()
            && !self.stale
            && match (max_age, self.fetched_at) {
                (Some(max), Some(at)) => at.elapsed() < max,
                _ => true,
            }
    }
}

struct CacheInner {
    entries: DashMap<CacheKey, Entry>,
    /// Bumped by `clear`. Entries recreated afterwards restart at epoch 0,
    /// so a fetch from an older generation must never commit.
    generation: AtomicU64,
    version: watch::Sender<u64>,
    max_age: Option<Duration>,
    read_retries: u32,
}

impl CacheInner {
    /// Store the outcome of a fetch started in `generation` / `epoch`.
    fn commit(
        &self,
        key: &CacheKey,
        generation: u64,
        epoch: u64,
        result: &Result<Payload, CoreError>,
    ) {
        let Some(mut entry) = self.entries.get_mut(key) else {
            trace!(%key, "entry removed while fetching; dropping result");
            return;
        };
        if self.generation.load(Ordering::SeqCst) != generation {
            trace!(%key, "cache cleared while fetching; dropping result");
            return;
        }

        let current = entry.epoch == epoch;
        if current {
            entry.in_flight = None;
        }

        match result {
            Ok(value) if current => {
                entry.value = Some(Arc::clone(value));
                entry.fetched_at = Some(Instant::now());
                entry.stale = false;
                debug!(%key, "cache entry committed");
            }
            Ok(value) if entry.value.is_none() => {
                // Invalidated mid-flight with nothing to show yet: keep the
                // result as a placeholder, still stale.
                entry.value = Some(Arc::clone(value));
                entry.fetched_at = Some(Instant::now());
                entry.stale = true;
                debug!(%key, "cache entry committed as stale placeholder");
            }
            Ok(_) => {
                trace!(%key, "discarding result fetched before invalidation");
                return;
            }
            Err(e) => {
                debug!(%key, error = %e, "fetch failed; entry unchanged");
                return;
            }
        }

        drop(entry);
        self.version.send_modify(|v| *v += 1);
    }
}

/// Keyed store of query results.
///
/// Cheaply cloneable; clones share the same entries.
#[derive(Clone)]
pub struct ResourceCache {
    inner: Arc<CacheInner>,
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("entries", &self.inner.entries.len())
            .field("version", &*self.inner.version.borrow())
            .finish_non_exhaustive()
    }
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceCache {
    /// One retry for transient failures, no time-based expiry.
    pub fn new() -> Self {
        Self::with_policy(1, None)
    }

    pub fn with_policy(read_retries: u32, max_age: Option<Duration>) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            inner: Arc::new(CacheInner {
                entries: DashMap::new(),
                generation: AtomicU64::new(0),
                version,
                max_age,
                read_retries,
            }),
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Return the value for `key`, fetching it when absent or stale.
    ///
    /// A fresh entry is returned without calling `fetcher`. If a fetch for
    /// `key` is already pending, this call joins it instead of starting
    /// another, and every joined caller resolves to the same value. A
    /// failed fetch leaves the entry as it was and returns the error.
    pub async fn read<T, F, Fut>(&self, key: CacheKey, fetcher: F) -> Result<Arc<T>, CoreError>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        let fetch = {
            let mut entry = self.inner.entries.entry(key.clone()).or_default();

            if entry.is_fresh(self.inner.max_age) {
                if let Some(value) = entry.value.clone() {
                    trace!(%key, "cache hit");
                    drop(entry);
                    return downcast(&key, value);
                }
            }

            if let Some(pending) = entry.in_flight.clone() {
                trace!(%key, "joining in-flight fetch");
                pending
            } else {
                debug!(%key, stale = entry.stale, "starting fetch");
                let pending = self.start_fetch(key.clone(), entry.epoch, fetcher);
                entry.in_flight = Some(pending.clone());
                pending
            }
        };

        let value = fetch.await?;
        downcast(&key, value)
    }

    fn start_fetch<T, F, Fut>(&self, key: CacheKey, epoch: u64, fetcher: F) -> SharedFetch
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let generation = inner.generation.load(Ordering::SeqCst);
        async move {
            let result = fetch_with_retries(&key, inner.read_retries, &fetcher)
                .await
                .map(|value| Arc::new(value) as Payload);
            inner.commit(&key, generation, epoch, &result);
            result
        }
        .boxed()
        .shared()
    }

    /// The current value without fetching, possibly stale. Views can show
    /// it as a placeholder while [`read`](Self::read) refetches.
    pub fn peek<T: Send + Sync + 'static>(&self, key: &CacheKey) -> Option<Cached<T>> {
        let entry = self.inner.entries.get(key)?;
        let stale = !entry.is_fresh(self.inner.max_age);
        let value = entry.value.clone()?.downcast::<T>().ok()?;
        Some(Cached { value, stale })
    }

    /// `true` when `key` holds a value that a read would return without
    /// a network call.
    pub fn is_fresh(&self, key: &CacheKey) -> bool {
        self.inner
            .entries
            .get(key)
            .is_some_and(|e| e.is_fresh(self.inner.max_age))
    }

    pub fn is_fetching(&self, key: &CacheKey) -> bool {
        self.inner
            .entries
            .get(key)
            .is_some_and(|e| e.in_flight.is_some())
    }

    // ── Invalidation ─────────────────────────────────────────────────

    /// Mark every entry matching `predicate` stale. Payloads are kept so
    /// they can still be shown; the next read of each refetches. Returns
    /// the number of entries touched.
    pub fn invalidate(&self, predicate: &KeyPredicate) -> usize {
        let mut touched = 0;
        for mut entry in self.inner.entries.iter_mut() {
            if predicate.matches(entry.key()) {
                let entry = entry.value_mut();
                entry.stale = true;
                entry.epoch += 1;
                entry.in_flight = None;
                touched += 1;
            }
        }

        if touched > 0 {
            debug!(%predicate, touched, "invalidated cache entries");
            self.inner.version.send_modify(|v| *v += 1);
        }
        touched
    }

    pub fn invalidate_all(&self, predicates: &[KeyPredicate]) -> usize {
        predicates.iter().map(|p| self.invalidate(p)).sum()
    }

    /// Drop every entry, payloads included. Used on logout so one user's
    /// data is never shown to the next.
    pub fn clear(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.entries.clear();
        self.inner.version.send_modify(|v| *v += 1);
        debug!("cache cleared");
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    // ── Change notification ──────────────────────────────────────────

    /// Current version; bumped on every commit, invalidation and clear.
    pub fn version(&self) -> u64 {
        *self.inner.version.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.version.subscribe()
    }

    /// Version changes as a `Stream`.
    pub fn changes(&self) -> CacheChanges {
        CacheChanges {
            inner: WatchStream::new(self.subscribe()),
        }
    }
}

/// `Stream` of cache versions, yielding the current version first.
pub struct CacheChanges {
    inner: WatchStream<u64>,
}

impl Stream for CacheChanges {
    type Item = u64;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

async fn fetch_with_retries<T, F, Fut>(
    key: &CacheKey,
    retries: u32,
    fetcher: &F,
) -> Result<T, CoreError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, CoreError>>,
{
    let mut attempt = 0;
    loop {
        match fetcher().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < retries && e.is_transient() => {
                attempt += 1;
                warn!(%key, attempt, error = %e, "transient read failure; retrying");
                tokio::time::sleep(RETRY_DELAY).await;
            }
            Err(e) => return Err(e),
        }
    }
}

fn downcast<T: Send + Sync + 'static>(key: &CacheKey, value: Payload) -> Result<Arc<T>, CoreError> {
    value.downcast::<T>().map_err(|_| CoreError::Decode {
        message: format!(
            "cached value for {key} is not a {}",
            std::any::type_name::<T>()
        ),
    })
}
