//! Cache-aside reads with single-flight loading.
//!
//! On a miss exactly one caller per key runs the loader; concurrent callers for
//! the same key wait on a watch channel and receive the leader's outcome,
//! success or failure. Only successes are written to the cache. Keys are
//! coordinated independently, so a slow load for one key never blocks another.

use common::MetricsRecorder;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::Cache;

type Outcome<T, E> = Option<Result<T, E>>;
type InFlight<T, E> = Mutex<HashMap<String, watch::Receiver<Outcome<T, E>>>>;

enum Flight<T, E> {
    Leader(watch::Sender<Outcome<T, E>>),
    Follower(watch::Receiver<Outcome<T, E>>),
}

/// Removes the in-flight entry when the leader finishes or is dropped mid-load.
struct FlightGuard<'a, T, E> {
    in_flight: &'a InFlight<T, E>,
    key: &'a str,
}

impl<T, E> Drop for FlightGuard<'_, T, E> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(self.key);
    }
}

pub struct CacheAside<T, E> {
    cache: Arc<dyn Cache>,
    name: &'static str,
    in_flight: InFlight<T, E>,
    metrics: Arc<dyn MetricsRecorder>,
}

impl<T, E> CacheAside<T, E>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync,
    E: Clone + Send + Sync,
{
    /// `name` labels cache hit/miss metrics
    pub fn new(cache: Arc<dyn Cache>, name: &'static str, metrics: Arc<dyn MetricsRecorder>) -> Self {
        Self {
            cache,
            name,
            in_flight: Mutex::new(HashMap::new()),
            metrics,
        }
    }

    /// Return the cached value for `key`, or run `loader` once across all
    /// concurrent callers and cache its success for `ttl`.
    pub async fn get_or_set<F, Fut>(&self, key: &str, ttl: Duration, loader: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.read(key).await {
            self.metrics.record_cache_request(self.name, true);
            return Ok(value);
        }
        self.metrics.record_cache_request(self.name, false);

        loop {
            match self.join(key) {
                Flight::Follower(mut rx) => {
                    debug!(key = %key, "Waiting on in-flight load");
                    let outcome = rx
                        .wait_for(Option::is_some)
                        .await
                        .ok()
                        .and_then(|slot| slot.clone());

                    match outcome {
                        Some(result) => return result,
                        // leader was cancelled before publishing; try again
                        None => continue,
                    }
                }
                Flight::Leader(tx) => {
                    let _guard = FlightGuard {
                        in_flight: &self.in_flight,
                        key,
                    };

                    // a flight that finished between our miss and our join
                    // has already populated the cache
                    let result = match self.read(key).await {
                        Some(value) => Ok(value),
                        None => {
                            let loaded = loader().await;
                            if let Ok(value) = &loaded {
                                self.write(key, value, ttl).await;
                            }
                            loaded
                        }
                    };

                    tx.send_replace(Some(result.clone()));
                    return result;
                }
            }
        }
    }

    /// Number of keys currently being loaded
    pub fn in_flight(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn join(&self, key: &str) -> Flight<T, E> {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(rx) = in_flight.get(key) {
            return Flight::Follower(rx.clone());
        }

        let (tx, rx) = watch::channel(None);
        in_flight.insert(key.to_string(), rx);
        Flight::Leader(tx)
    }

    async fn read(&self, key: &str) -> Option<T> {
        match self.cache.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed, falling back to loader");
                None
            }
        }
    }

    async fn write(&self, key: &str, value: &T, ttl: Duration) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to serialize value for cache");
                return;
            }
        };

        if let Err(e) = self.cache.set(key, &raw, ttl).await {
            warn!(key = %key, error = %e, "Failed to populate cache");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use common::NoopMetrics;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    struct LoadError(String);

    fn cache_aside(cache: Arc<InMemoryCache>) -> Arc<CacheAside<String, LoadError>> {
        Arc::new(CacheAside::new(cache, "test", Arc::new(NoopMetrics)))
    }

    #[tokio::test]
    async fn test_hit_skips_loader() {
        let cache = Arc::new(InMemoryCache::new());
        cache
            .set("k", "\"cached\"", Duration::from_secs(60))
            .await
            .unwrap();
        let loader_calls = AtomicUsize::new(0);

        let value = cache_aside(cache)
            .get_or_set("k", Duration::from_secs(60), || async {
                loader_calls.fetch_add(1, Ordering::SeqCst);
                Ok("loaded".to_string())
            })
            .await
            .unwrap();

        assert_eq!(value, "cached");
        assert_eq!(loader_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_miss_loads_and_caches() {
        let cache = Arc::new(InMemoryCache::new());
        let loader = cache_aside(cache.clone());

        let value = loader
            .get_or_set("k", Duration::from_secs(60), || async { Ok("loaded".to_string()) })
            .await
            .unwrap();

        assert_eq!(value, "loaded");
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("\"loaded\""));
        assert_eq!(loader.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_misses_load_once() {
        let cache = Arc::new(InMemoryCache::new());
        let loader = cache_aside(cache);
        let loader_calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let loader = loader.clone();
            let loader_calls = loader_calls.clone();
            handles.push(tokio::spawn(async move {
                loader
                    .get_or_set("k", Duration::from_secs(60), || async move {
                        loader_calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok("expensive".to_string())
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "expensive");
        }
        assert_eq!(loader_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_is_shared_and_not_cached() {
        let cache = Arc::new(InMemoryCache::new());
        let loader = cache_aside(cache.clone());
        let loader_calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let loader = loader.clone();
            let loader_calls = loader_calls.clone();
            handles.push(tokio::spawn(async move {
                loader
                    .get_or_set("k", Duration::from_secs(60), || async move {
                        loader_calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Err::<String, _>(LoadError("not found".to_string()))
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Err(LoadError("not found".to_string())));
        }
        assert_eq!(loader_calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.writes(), 0);

        // the failure was not remembered
        let retry = loader
            .get_or_set("k", Duration::from_secs(60), || async { Ok("found".to_string()) })
            .await;
        assert_eq!(retry, Ok("found".to_string()));
    }

    #[tokio::test]
    async fn test_different_keys_do_not_wait_on_each_other() {
        let cache = Arc::new(InMemoryCache::new());
        let loader = cache_aside(cache);

        let slow = {
            let loader = loader.clone();
            tokio::spawn(async move {
                loader
                    .get_or_set("slow", Duration::from_secs(60), || async {
                        tokio::time::sleep(Duration::from_millis(500)).await;
                        Ok("slow".to_string())
                    })
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        let fast = tokio::time::timeout(
            Duration::from_millis(200),
            loader.get_or_set("fast", Duration::from_secs(60), || async {
                Ok("fast".to_string())
            }),
        )
        .await;

        assert_eq!(fast.unwrap(), Ok("fast".to_string()));
        assert_eq!(slow.await.unwrap(), Ok("slow".to_string()));
    }

    #[tokio::test]
    async fn test_cancelled_leader_hands_over() {
        let cache = Arc::new(InMemoryCache::new());
        let loader = cache_aside(cache);

        let leader = {
            let loader = loader.clone();
            tokio::spawn(async move {
                loader
                    .get_or_set("k", Duration::from_secs(60), || async {
                        tokio::time::sleep(Duration::from_secs(10)).await;
                        Ok("never".to_string())
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let follower = {
            let loader = loader.clone();
            tokio::spawn(async move {
                loader
                    .get_or_set("k", Duration::from_secs(60), || async {
                        Ok("recovered".to_string())
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        leader.abort();

        let result = tokio::time::timeout(Duration::from_secs(1), follower)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result, Ok("recovered".to_string()));
    }

    #[tokio::test]
    async fn test_cache_outage_falls_back_to_loader() {
        let cache = Arc::new(InMemoryCache::new());
        cache.set_unavailable(true);
        let loader = cache_aside(cache);

        let value = loader
            .get_or_set("k", Duration::from_secs(60), || async { Ok("direct".to_string()) })
            .await;
        assert_eq!(value, Ok("direct".to_string()));
    }
}
