//! Cache Strategies
//!
//! Executes the three read strategies against a named bucket: cache-first,
//! stale-while-revalidate and network-first. Every strategy keys the store
//! by the normalized cache identity while fetching the original URL.

use std::collections::HashMap;
use std::sync::Arc;

use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::time::Clock;
use core_store::{CachedResponse, ResponseCache};
use tracing::{debug, warn};

use crate::error::{CacheError, Result};
use crate::router::normalize_cache_key;

/// Runs the read strategies for classified requests.
///
/// Holds shared handles only; the revalidation task spawned by
/// [`stale_while_revalidate`](StrategyExecutor::stale_while_revalidate)
/// carries its own clones and outlives the call that spawned it.
#[derive(Clone)]
pub struct StrategyExecutor {
    cache: Arc<dyn ResponseCache>,
    http: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
}

impl StrategyExecutor {
    pub fn new(
        cache: Arc<dyn ResponseCache>,
        http: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { cache, http, clock }
    }

    /// Serve from the bucket, fetching and storing on a miss.
    ///
    /// Only a 200 response is stored and returned; any other status or a
    /// failed fetch surfaces as an error with no fallback.
    pub async fn cache_first(&self, bucket: &str, request: &HttpRequest) -> Result<HttpResponse> {
        let key = normalize_cache_key(&request.url);
        let method = request.method.as_str();

        if let Some(cached) = self.cache.get(bucket, method, &key).await? {
            debug!(bucket, url = %key, "Cache hit");
            return Ok(cached_to_response(cached));
        }

        debug!(bucket, url = %key, "Cache miss, fetching");
        let response = self.http.execute(request.clone()).await?;

        if response.status != 200 {
            return Err(CacheError::UpstreamStatus {
                status: response.status,
                url: key,
            });
        }

        self.cache
            .put(bucket, method, &key, &self.capture(&response))
            .await?;

        Ok(response)
    }

    /// Serve the cached copy immediately and refresh it in the background.
    ///
    /// The revalidation task runs on every call; a hit returns the stored
    /// copy without waiting for it, a miss awaits its network result. Only
    /// a 200 refresh is stored.
    pub async fn stale_while_revalidate(
        &self,
        bucket: &str,
        request: &HttpRequest,
    ) -> Result<HttpResponse> {
        let key = normalize_cache_key(&request.url);
        let method = request.method.as_str().to_string();

        let cached = self.cache.get(bucket, &method, &key).await?;
        let refresh = self.spawn_revalidation(bucket.to_string(), method, key.clone(), request);

        match cached {
            Some(hit) => {
                debug!(bucket, url = %key, "Cache hit, revalidating in background");
                Ok(cached_to_response(hit))
            }
            None => {
                debug!(bucket, url = %key, "Cache miss, awaiting network");
                match refresh.await {
                    Ok(result) => result,
                    Err(join_error) => Err(CacheError::Revalidation(join_error.to_string())),
                }
            }
        }
    }

    /// Serve from the network, falling back to the cached copy offline.
    ///
    /// A 200 response refreshes the bucket; any other status is returned
    /// untouched and not stored. Only a failed fetch falls back.
    pub async fn network_first(&self, bucket: &str, request: &HttpRequest) -> Result<HttpResponse> {
        let key = normalize_cache_key(&request.url);
        let method = request.method.as_str();

        let fetch_error = match self.http.execute(request.clone()).await {
            Ok(response) => {
                if response.status == 200 {
                    self.cache
                        .put(bucket, method, &key, &self.capture(&response))
                        .await?;
                }
                return Ok(response);
            }
            Err(e) => e,
        };

        warn!(bucket, url = %key, error = %fetch_error, "Network fetch failed, trying cache");

        match self.cache.get(bucket, method, &key).await? {
            Some(cached) => Ok(cached_to_response(cached)),
            None => Err(CacheError::Bridge(fetch_error)),
        }
    }

    fn spawn_revalidation(
        &self,
        bucket: String,
        method: String,
        key: String,
        request: &HttpRequest,
    ) -> tokio::task::JoinHandle<Result<HttpResponse>> {
        let cache = Arc::clone(&self.cache);
        let http = Arc::clone(&self.http);
        let clock = Arc::clone(&self.clock);
        let request = request.clone();

        tokio::spawn(async move {
            let response = match http.execute(request).await {
                Ok(response) => response,
                Err(e) => {
                    debug!(url = %key, error = %e, "Revalidation fetch failed");
                    return Err(CacheError::Bridge(e));
                }
            };

            if response.status == 200 {
                let copy = capture_at(&response, clock.unix_timestamp_millis());
                if let Err(e) = cache.put(&bucket, &method, &key, &copy).await {
                    warn!(bucket = %bucket, url = %key, error = %e, "Failed to store revalidated copy");
                    return Err(e.into());
                }
            }

            Ok(response)
        })
    }

    fn capture(&self, response: &HttpResponse) -> CachedResponse {
        capture_at(response, self.clock.unix_timestamp_millis())
    }
}

/// Snapshot a network response for storage.
pub(crate) fn capture_at(response: &HttpResponse, stored_at: i64) -> CachedResponse {
    let headers: Vec<(String, String)> = response
        .headers
        .iter()
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    CachedResponse::new(response.status, headers, response.body.clone(), stored_at)
}

/// Rehydrate a stored snapshot into a servable response.
pub(crate) fn cached_to_response(cached: CachedResponse) -> HttpResponse {
    HttpResponse {
        status: cached.status,
        headers: cached.headers.into_iter().collect::<HashMap<_, _>>(),
        body: cached.body,
    }
}
