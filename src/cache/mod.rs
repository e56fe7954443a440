//! Stale-while-revalidate cache with request coalescing.
//!
//! Every upstream read goes through [`CacheService::get_or_fetch`]: fresh
//! entries are returned directly, stale-but-usable entries are returned
//! immediately while a background task refreshes them, and concurrent
//! requests for the same key are collapsed onto a single upstream fetch.
//!
//! Fetches run on spawned tasks, so a caller that stops awaiting does not
//! cancel the upstream call and the result still lands in the cache.
//!
//! Failure policy is availability over freshness: if a fetch fails and any
//! entry exists for the key (even an expired one), the old value is served
//! and the error only logged.

pub mod key;

pub use key::cache_key;

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;
use lru::LruCache;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Freshness profile selected per call site to match data volatility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheClass {
    Live,
    Upcoming,
    Recent,
    Leagues,
    Standings,
}

impl CacheClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheClass::Live => "live",
            CacheClass::Upcoming => "upcoming",
            CacheClass::Recent => "recent",
            CacheClass::Leagues => "leagues",
            CacheClass::Standings => "standings",
        }
    }
}

/// (ttl, stale_window) pair for one cache class.
///
/// An entry is fresh while `age < ttl`, stale-but-usable while
/// `ttl <= age < stale_window`, and expired beyond that.
#[derive(Debug, Clone, Copy)]
pub struct FreshnessPolicy {
    pub ttl: Duration,
    pub stale_window: Duration,
}

impl FreshnessPolicy {
    pub const fn new(ttl: Duration, stale_window: Duration) -> Self {
        FreshnessPolicy { ttl, stale_window }
    }
}

/// Per-class freshness policies plus the LRU bound.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub live: FreshnessPolicy,
    pub upcoming: FreshnessPolicy,
    pub recent: FreshnessPolicy,
    pub leagues: FreshnessPolicy,
    pub standings: FreshnessPolicy,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            live: FreshnessPolicy::new(Duration::from_secs(15), Duration::from_secs(30)),
            upcoming: FreshnessPolicy::new(Duration::from_secs(120), Duration::from_secs(300)),
            recent: FreshnessPolicy::new(Duration::from_secs(300), Duration::from_secs(600)),
            leagues: FreshnessPolicy::new(
                Duration::from_secs(12 * 60 * 60),
                Duration::from_secs(24 * 60 * 60),
            ),
            standings: FreshnessPolicy::new(
                Duration::from_secs(12 * 60 * 60),
                Duration::from_secs(24 * 60 * 60),
            ),
            max_entries: 500,
        }
    }
}

impl CacheConfig {
    fn policy(&self, class: CacheClass) -> FreshnessPolicy {
        match class {
            CacheClass::Live => self.live,
            CacheClass::Upcoming => self.upcoming,
            CacheClass::Recent => self.recent,
            CacheClass::Leagues => self.leagues,
            CacheClass::Standings => self.standings,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Freshness {
    Fresh,
    Stale,
    Expired,
}

struct Entry {
    data: Value,
    stored_at: Instant,
    class: CacheClass,
}

impl Entry {
    fn freshness(&self, policy: &FreshnessPolicy, now: Instant) -> Freshness {
        let age = now.saturating_duration_since(self.stored_at);
        if age < policy.ttl {
            Freshness::Fresh
        } else if age < policy.stale_window {
            Freshness::Stale
        } else {
            Freshness::Expired
        }
    }
}

/// Result shared between coalesced callers. The error side is `Arc`ed so the
/// same failure can be handed to every waiter.
type FetchResult = std::result::Result<Value, Arc<anyhow::Error>>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

struct Inner {
    entries: LruCache<String, Entry>,
    /// At most one outstanding upstream fetch per key.
    in_flight: HashMap<String, SharedFetch>,
}

/// Thread-safe cache service. Cheap to clone; clones share the same table
/// and in-flight registry.
#[derive(Clone)]
pub struct CacheService {
    inner: Arc<Mutex<Inner>>,
    config: Arc<CacheConfig>,
}

impl CacheService {
    pub fn new(config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries.max(1)).unwrap();
        CacheService {
            inner: Arc::new(Mutex::new(Inner {
                entries: LruCache::new(capacity),
                in_flight: HashMap::new(),
            })),
            config: Arc::new(config),
        }
    }

    /// Typed entry point: serializes the fetched value into the cache and
    /// deserializes on hits. `fetch` is only polled on a miss or refresh.
    pub async fn get_or_fetch<T, Fut>(&self, key: &str, class: CacheClass, fetch: Fut) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let boxed = async move {
            let value = fetch.await?;
            serde_json::to_value(&value).map_err(anyhow::Error::from)
        }
        .boxed();
        let raw = self.get_or_fetch_value(key, class, boxed).await?;
        serde_json::from_value(raw)
            .map_err(|e| anyhow!("cached payload for '{key}' does not match requested type: {e}"))
    }

    /// Untyped core: coalesce → consult cache → fetch.
    pub async fn get_or_fetch_value(
        &self,
        key: &str,
        class: CacheClass,
        fetch: BoxFuture<'static, Result<Value>>,
    ) -> Result<Value> {
        let now = Instant::now();

        let (shared, stale_fallback) = {
            let mut inner = self.inner.lock().await;

            // Another caller is already fetching this key: join it.
            if let Some(existing) = inner.in_flight.get(key) {
                debug!(key, "joining in-flight fetch");
                let shared = existing.clone();
                let stale = inner.entries.peek(key).map(|e| e.data.clone());
                (shared, stale)
            } else {
                // Freshness follows the class the entry was written under.
                let config = Arc::clone(&self.config);
                let state = inner
                    .entries
                    .get(key)
                    .map(|e| (e.freshness(&config.policy(e.class), now), e.data.clone()));
                match state {
                    Some((Freshness::Fresh, data)) => {
                        debug!(key, "cache hit (fresh)");
                        return Ok(data);
                    }
                    Some((Freshness::Stale, data)) => {
                        // Serve the old value now, refresh behind the caller's
                        // back. The task is registered in-flight so concurrent
                        // callers coalesce onto it.
                        debug!(key, "cache hit (stale), revalidating in background");
                        self.spawn_fetch(&mut inner, key, class, fetch);
                        return Ok(data);
                    }
                    Some((Freshness::Expired, data)) => {
                        debug!(key, "cache entry expired, refetching");
                        (self.spawn_fetch(&mut inner, key, class, fetch), Some(data))
                    }
                    None => {
                        debug!(key, "cache miss, fetching");
                        (self.spawn_fetch(&mut inner, key, class, fetch), None)
                    }
                }
            }
        };

        match shared.await {
            Ok(value) => Ok(value),
            Err(err) => match stale_fallback {
                // Availability over freshness: an old value beats an error.
                Some(stale) => {
                    warn!(key, "fetch failed, serving stale entry: {err:#}");
                    Ok(stale)
                }
                None => Err(anyhow!("fetch for '{key}' failed: {err:#}")),
            },
        }
    }

    /// Spawn the upstream fetch on its own task and register it in-flight.
    ///
    /// The task owns the cache update and the unconditional deregistration,
    /// so both happen even if every caller stops awaiting.
    fn spawn_fetch(
        &self,
        inner: &mut Inner,
        key: &str,
        class: CacheClass,
        fetch: BoxFuture<'static, Result<Value>>,
    ) -> SharedFetch {
        let state = Arc::clone(&self.inner);
        let task_key = key.to_string();
        let handle = tokio::spawn(async move {
            let result = fetch.await;
            let mut inner = state.lock().await;
            inner.in_flight.remove(&task_key);
            match result {
                Ok(value) => {
                    inner.entries.put(
                        task_key,
                        Entry {
                            data: value.clone(),
                            stored_at: Instant::now(),
                            class,
                        },
                    );
                    Ok(value)
                }
                Err(err) => {
                    // Only observable outcome of a background revalidation.
                    warn!(key = %task_key, "upstream fetch failed: {err:#}");
                    Err(Arc::new(err))
                }
            }
        });

        let panic_key = key.to_string();
        let shared = async move {
            match handle.await {
                Ok(result) => result,
                Err(err) => Err(Arc::new(anyhow!("fetch task for '{panic_key}' died: {err}"))),
            }
        }
        .boxed()
        .shared();

        inner.in_flight.insert(key.to_string(), shared.clone());
        shared
    }

    /// Drop every entry whose key contains `pattern`. Returns the number of
    /// entries removed. Surfaced to operational tooling; the request path
    /// never invalidates explicitly.
    #[allow(dead_code)]
    pub async fn invalidate_matching(&self, pattern: &str) -> usize {
        let mut inner = self.inner.lock().await;
        let keys: Vec<String> = inner
            .entries
            .iter()
            .filter(|(k, _)| k.contains(pattern))
            .map(|(k, _)| k.clone())
            .collect();
        for k in &keys {
            inner.entries.pop(k);
        }
        debug!(pattern, removed = keys.len(), "cache invalidation");
        keys.len()
    }

    #[allow(dead_code)]
    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.entries.clear();
    }

    #[allow(dead_code)]
    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    #[allow(dead_code)]
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
