// SPDX-License-Identifier: GPL-3.0-only

//! Persistent photo store
//!
//! Captured photos live in the dynamic cache under `photo-<epoch-millis>.png`
//! keys. The store degrades instead of failing: without a usable storage
//! root every write reports [`StorageError::Unavailable`] and every read
//! comes back empty.

use super::{Cache, CacheStorage, CachedResponse};
use crate::errors::{StorageError, StorageResult};
use crate::pipelines::photo::PNG_CONTENT_TYPE;
use std::fmt;
use tracing::{debug, info, warn};

const KEY_PREFIX: &str = "photo-";
const KEY_SUFFIX: &str = ".png";

/// Storage key of a captured photo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhotoKey {
    millis: i64,
}

impl PhotoKey {
    pub fn from_millis(millis: i64) -> Self {
        Self { millis }
    }

    /// Capture time in epoch milliseconds
    pub fn millis(&self) -> i64 {
        self.millis
    }

    /// Parse `photo-<millis>.png`
    pub fn parse(key: &str) -> Option<Self> {
        key.strip_prefix(KEY_PREFIX)?
            .strip_suffix(KEY_SUFFIX)?
            .parse::<i64>()
            .ok()
            .map(Self::from_millis)
    }
}

impl fmt::Display for PhotoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", KEY_PREFIX, self.millis, KEY_SUFFIX)
    }
}

/// Millisecond clock used for key generation
pub type Clock = Box<dyn Fn() -> i64 + Send + Sync>;

/// Generates photo keys from the capture time
///
/// Keys are only unique to the millisecond. Two captures in the same
/// millisecond get the same key and the later write replaces the earlier
/// photo in the store; the generator logs a warning when that happens.
pub struct KeyGenerator {
    clock: Clock,
    last: Option<PhotoKey>,
}

impl KeyGenerator {
    /// Generator on the system clock
    pub fn new() -> Self {
        Self::with_clock(Box::new(|| chrono::Utc::now().timestamp_millis()))
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self { clock, last: None }
    }

    pub fn next_key(&mut self) -> PhotoKey {
        let key = PhotoKey::from_millis((self.clock)());
        if self.last == Some(key) {
            warn!(%key, "Photo key collides with the previous capture, it will be overwritten");
        }
        self.last = Some(key);
        key
    }
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for KeyGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyGenerator")
            .field("last", &self.last)
            .finish()
    }
}

/// Blob cache store for captured photos
#[derive(Debug, Clone)]
pub struct PhotoStore {
    cache: Option<Cache>,
}

impl PhotoStore {
    /// Open the named photo cache, degrading to an unavailable store on error
    pub async fn open(storage: &CacheStorage, name: &str) -> Self {
        match storage.open_cache(name).await {
            Ok(cache) => {
                info!(cache = %name, "Photo store ready");
                Self { cache: Some(cache) }
            }
            Err(e) => {
                warn!(cache = %name, error = %e, "Photo store unavailable");
                Self::unavailable()
            }
        }
    }

    /// A store with no backing cache
    pub fn unavailable() -> Self {
        Self { cache: None }
    }

    pub fn is_available(&self) -> bool {
        self.cache.is_some()
    }

    /// Persist a PNG payload; re-putting a key overwrites it
    pub async fn put(&self, key: &str, payload: Vec<u8>) -> StorageResult<()> {
        let cache = self
            .cache
            .as_ref()
            .ok_or_else(|| StorageError::Unavailable("photo cache not open".into()))?;

        cache
            .put(key, CachedResponse::ok(PNG_CONTENT_TYPE, payload))
            .await?;
        info!(key, "Photo saved to cache");
        Ok(())
    }

    /// All stored keys in the order the cache yields them
    pub async fn list_keys(&self) -> Vec<String> {
        let Some(cache) = &self.cache else {
            return Vec::new();
        };
        match cache.keys().await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "Failed to list photo keys");
                Vec::new()
            }
        }
    }

    /// Fetch the payload stored under `key`
    pub async fn get_by_key(&self, key: &str) -> StorageResult<Vec<u8>> {
        let Some(cache) = &self.cache else {
            return Err(StorageError::NotFound(key.to_string()));
        };
        match cache.match_key(key).await? {
            Some(response) => {
                debug!(key, size = response.body.len(), "Photo fetched from cache");
                Ok(response.body)
            }
            None => Err(StorageError::NotFound(key.to_string())),
        }
    }
}
