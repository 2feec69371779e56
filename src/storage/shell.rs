// SPDX-License-Identifier: GPL-3.0-only

//! App shell cache
//!
//! Fixed application resources are bundled into the binary and precached
//! into a versioned named cache on install. Lookups are cache-first and fall
//! back to the bundled copy. Activation deletes every cache that is neither
//! the current shell cache nor the dynamic photo cache.

use super::{Cache, CacheStorage, CachedResponse};
use crate::constants::storage::SHELL_MANIFEST;
use crate::errors::{StorageError, StorageResult};
use rust_embed::RustEmbed;
use tracing::{debug, info};

#[derive(RustEmbed)]
#[folder = "resources/shell/"]
struct ShellAssets;

/// Content type from the resource extension
fn content_type(key: &str) -> &'static str {
    match key.rsplit_once('.').map(|(_, ext)| ext) {
        Some("txt") => "text/plain; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}

/// Bundled copy of a resource, addressed as `./name` or `name`
fn bundled(key: &str) -> Option<CachedResponse> {
    let path = key.strip_prefix("./").unwrap_or(key);
    let file = ShellAssets::get(path)?;
    Some(CachedResponse::ok(content_type(key), file.data.into_owned()))
}

/// Versioned cache of the bundled shell resources
#[derive(Debug, Clone)]
pub struct ShellCache {
    storage: CacheStorage,
    cache: Cache,
    dynamic_cache: String,
}

impl ShellCache {
    /// Open the shell cache `name`; `dynamic_cache` survives activation
    pub async fn open(
        storage: &CacheStorage,
        name: &str,
        dynamic_cache: &str,
    ) -> StorageResult<Self> {
        let cache = storage.open_cache(name).await?;
        Ok(Self {
            storage: storage.clone(),
            cache,
            dynamic_cache: dynamic_cache.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        self.cache.name()
    }

    /// Precache every resource of the shell manifest
    pub async fn install(&self) -> StorageResult<usize> {
        self.precache(SHELL_MANIFEST).await
    }

    /// Precache `keys`; nothing is written unless every key is bundled
    pub async fn precache(&self, keys: &[&str]) -> StorageResult<usize> {
        let mut responses = Vec::with_capacity(keys.len());
        for key in keys {
            let response = bundled(key).ok_or_else(|| StorageError::NotFound(key.to_string()))?;
            responses.push((*key, response));
        }

        for (key, response) in responses {
            self.cache.put(key, response).await?;
        }
        info!(cache = %self.name(), count = keys.len(), "App shell cached");
        Ok(keys.len())
    }

    /// Cache-first lookup with fallback to the bundled copy
    pub async fn fetch(&self, key: &str) -> StorageResult<CachedResponse> {
        if let Some(hit) = self.cache.match_key(key).await? {
            debug!(key, "Shell resource served from cache");
            return Ok(hit);
        }
        debug!(key, "Shell resource not cached, using bundled copy");
        bundled(key).ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    /// Fetch a resource as UTF-8 text
    pub async fn fetch_text(&self, key: &str) -> StorageResult<String> {
        let response = self.fetch(key).await?;
        String::from_utf8(response.body)
            .map_err(|e| StorageError::Corrupt(format!("{}: {}", key, e)))
    }

    /// Delete every cache other than this shell and the dynamic cache
    ///
    /// Returns the names of the deleted caches.
    pub async fn activate(&self) -> StorageResult<Vec<String>> {
        let mut deleted = Vec::new();
        for name in self.storage.keys().await? {
            if name == self.name() || name == self.dynamic_cache {
                continue;
            }
            if self.storage.delete(&name).await? {
                info!(cache = %name, "Deleted stale cache");
                deleted.push(name);
            }
        }
        Ok(deleted)
    }
}
