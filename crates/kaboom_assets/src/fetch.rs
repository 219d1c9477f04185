//! Single-asset fetching with timeout, retry, decode verification and a
//! per-session cache.
//!
//! Cache discipline, keyed by the final resolved URL:
//!   - a successful load is kept for the rest of the session;
//!   - while a fetch is running, every caller for the same URL awaits the same
//!     shared future, so at most one fetch per URL is outstanding;
//!   - a failed fetch is evicted once it settles, so a later phase may retry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use kaboom_core::AssetPath;
use url::Url;

use crate::error::FetchError;
use crate::source::AssetSource;
use crate::table::ImageHandle;

#[derive(Debug, Clone)]
pub struct FetchPolicy {
    /// Hard limit per attempt; a timed-out attempt is abandoned.
    pub timeout: Duration,
    /// Extra attempts after the first.
    pub retries: u32,
    /// Linear backoff unit: attempt `n` waits `backoff * n` before retrying.
    pub backoff: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5000),
            retries: 2,
            backoff: Duration::from_millis(100),
        }
    }
}

type SharedFetch = Shared<BoxFuture<'static, Result<ImageHandle, FetchError>>>;

enum CacheEntry {
    Ready(ImageHandle),
    InFlight { generation: u64, fetch: SharedFetch },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    pub cached: usize,
    pub in_flight: usize,
    /// Transport requests issued, retries included.
    pub source_requests: u64,
}

pub struct Fetcher {
    source: Arc<dyn AssetSource>,
    origin: Url,
    policy: FetchPolicy,
    cache: Mutex<HashMap<String, CacheEntry>>,
    generation: AtomicU64,
    source_requests: Arc<AtomicU64>,
}

impl Fetcher {
    pub fn new(source: Arc<dyn AssetSource>, origin: Url, policy: FetchPolicy) -> Self {
        Self {
            source,
            origin,
            policy,
            cache: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
            source_requests: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    fn lock_cache(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Final URL for `path` under this fetcher's origin.
    pub fn resolve(&self, path: &AssetPath) -> Result<Url, FetchError> {
        path.resolve(&self.origin)
            .map_err(|reason| FetchError::Invalid {
                url: path.to_string(),
                reason,
            })
    }

    /// Fetch and decode one image. Errors only after every retry failed.
    pub async fn fetch(&self, path: &AssetPath) -> Result<ImageHandle, FetchError> {
        let url = self.resolve(path)?;
        let key = url.to_string();

        let (generation, pending) = {
            let mut cache = self.lock_cache();
            match cache.get(&key) {
                Some(CacheEntry::Ready(image)) => return Ok(image.clone()),
                Some(CacheEntry::InFlight { generation, fetch }) => (*generation, fetch.clone()),
                None => {
                    let generation = self.generation.fetch_add(1, Ordering::Relaxed);
                    let fetch = fetch_with_retry(
                        self.source.clone(),
                        url,
                        self.policy.clone(),
                        self.source_requests.clone(),
                    )
                    .boxed()
                    .shared();
                    cache.insert(
                        key.clone(),
                        CacheEntry::InFlight {
                            generation,
                            fetch: fetch.clone(),
                        },
                    );
                    (generation, fetch)
                }
            }
        };

        let result = pending.await;

        let mut cache = self.lock_cache();
        let same_fetch = matches!(
            cache.get(&key),
            Some(CacheEntry::InFlight { generation: g, .. }) if *g == generation
        );
        if same_fetch {
            match &result {
                Ok(image) => {
                    cache.insert(key, CacheEntry::Ready(image.clone()));
                }
                Err(_) => {
                    cache.remove(&key);
                }
            }
        }
        result
    }

    /// Already-loaded image for `path`, without fetching.
    pub fn cached(&self, path: &AssetPath) -> Option<ImageHandle> {
        let key = self.resolve(path).ok()?.to_string();
        match self.lock_cache().get(&key) {
            Some(CacheEntry::Ready(image)) => Some(image.clone()),
            _ => None,
        }
    }

    pub fn stats(&self) -> FetchStats {
        let cache = self.lock_cache();
        let cached = cache
            .values()
            .filter(|e| matches!(e, CacheEntry::Ready(_)))
            .count();
        FetchStats {
            cached,
            in_flight: cache.len() - cached,
            source_requests: self.source_requests.load(Ordering::Relaxed),
        }
    }
}

async fn fetch_with_retry(
    source: Arc<dyn AssetSource>,
    url: Url,
    policy: FetchPolicy,
    source_requests: Arc<AtomicU64>,
) -> Result<ImageHandle, FetchError> {
    let mut attempt = 0u32;
    loop {
        source_requests.fetch_add(1, Ordering::Relaxed);
        let outcome = match tokio::time::timeout(policy.timeout, source.fetch_bytes(&url)).await {
            Ok(Ok(bytes)) => decode_image(&url, &bytes),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                timeout_ms: policy.timeout.as_millis() as u64,
            }),
        };

        match outcome {
            Ok(image) => {
                log::debug!("Loaded {} ({}x{})", url, image.width(), image.height());
                return Ok(image);
            }
            Err(err) if attempt < policy.retries => {
                attempt += 1;
                log::debug!(
                    "Retry {}/{} for {} after {}",
                    attempt,
                    policy.retries,
                    url,
                    err.kind()
                );
                tokio::time::sleep(policy.backoff * attempt).await;
            }
            Err(err) => {
                log::warn!("Giving up on {} after {} attempts: {}", url, attempt + 1, err);
                return Err(err);
            }
        }
    }
}

/// Decode bytes into an RGBA raster, rejecting zero-sized images.
pub fn decode_image(url: &Url, bytes: &[u8]) -> Result<ImageHandle, FetchError> {
    let invalid = |reason: String| FetchError::Invalid {
        url: url.to_string(),
        reason,
    };
    let image = image::load_from_memory(bytes)
        .map_err(|e| invalid(e.to_string()))?
        .to_rgba8();
    if image.width() == 0 || image.height() == 0 {
        return Err(invalid(format!(
            "decoded to {}x{}",
            image.width(),
            image.height()
        )));
    }
    Ok(Arc::new(image))
}
