// SPDX-License-Identifier: GPL-3.0-only

//! Named blob caches on disk
//!
//! A [`CacheStorage`] is a root directory holding one directory per named
//! cache. Each entry of a [`Cache`] is a body file plus a JSON metadata
//! sidecar; both are named by the hex encoding of the entry key, so keys
//! can contain any characters.
//!
//! ```text
//! <root>/
//! ├── camara-dynamic-v2/
//! │   ├── 70686f746f2d31….body
//! │   └── 70686f746f2d31….json   ← written last, defines existence
//! └── camara-shell-v4/
//! ```

pub mod photos;
pub mod shell;

pub use photos::{KeyGenerator, PhotoKey, PhotoStore};
pub use shell::ShellCache;

use crate::errors::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const BODY_EXTENSION: &str = "body";
const META_EXTENSION: &str = "json";

/// Minimal response envelope stored per entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl CachedResponse {
    /// A 200 response with the given body
    pub fn ok(content_type: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type: content_type.into(),
            body,
        }
    }
}

/// Sidecar metadata for one entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryMeta {
    key: String,
    status: u16,
    content_type: String,
    stored_at_ms: i64,
}

/// Root of all named caches
#[derive(Debug, Clone)]
pub struct CacheStorage {
    root: PathBuf,
}

impl CacheStorage {
    /// Open (creating if needed) the storage root
    pub async fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| StorageError::Unavailable(format!("{}: {}", root.display(), e)))?;
        debug!(root = %root.display(), "Cache storage ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Open a named cache, creating it if missing
    pub async fn open_cache(&self, name: &str) -> StorageResult<Cache> {
        validate_cache_name(name)?;
        let dir = self.root.join(name);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::Unavailable(format!("{}: {}", dir.display(), e)))?;
        Ok(Cache {
            name: name.to_string(),
            dir,
        })
    }

    /// Whether a named cache exists
    pub async fn has(&self, name: &str) -> bool {
        validate_cache_name(name).is_ok()
            && tokio::fs::metadata(self.root.join(name))
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false)
    }

    /// Names of all caches
    pub async fn keys(&self) -> StorageResult<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?
        {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if is_dir && let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    /// Delete a named cache and everything in it
    ///
    /// Returns `false` when no such cache existed.
    pub async fn delete(&self, name: &str) -> StorageResult<bool> {
        validate_cache_name(name)?;
        match tokio::fs::remove_dir_all(self.root.join(name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::WriteFailed(e.to_string())),
        }
    }
}

/// Cache names become directory names
fn validate_cache_name(name: &str) -> StorageResult<()> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StorageError::Unavailable(format!(
            "invalid cache name: {:?}",
            name
        )))
    }
}

/// One named cache
#[derive(Debug, Clone)]
pub struct Cache {
    name: String,
    dir: PathBuf,
}

impl Cache {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn entry_path(&self, key: &str, extension: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", encode_key(key), extension))
    }

    /// Store a response under `key`, replacing any previous entry
    pub async fn put(&self, key: &str, response: CachedResponse) -> StorageResult<()> {
        let meta = EntryMeta {
            key: key.to_string(),
            status: response.status,
            content_type: response.content_type,
            stored_at_ms: chrono::Utc::now().timestamp_millis(),
        };
        let meta_json = serde_json::to_vec(&meta)
            .map_err(|e| StorageError::WriteFailed(format!("metadata for {}: {}", key, e)))?;

        write_atomic(&self.entry_path(key, BODY_EXTENSION), &response.body).await?;
        write_atomic(&self.entry_path(key, META_EXTENSION), &meta_json).await?;

        debug!(cache = %self.name, key, size = response.body.len(), "Entry stored");
        Ok(())
    }

    /// Look up the response stored under `key`
    pub async fn match_key(&self, key: &str) -> StorageResult<Option<CachedResponse>> {
        let meta = match tokio::fs::read(self.entry_path(key, META_EXTENSION)).await {
            Ok(bytes) => serde_json::from_slice::<EntryMeta>(&bytes)
                .map_err(|e| StorageError::Corrupt(format!("{}: {}", key, e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::Corrupt(format!("{}: {}", key, e))),
        };

        let body = tokio::fs::read(self.entry_path(key, BODY_EXTENSION))
            .await
            .map_err(|e| StorageError::Corrupt(format!("body of {}: {}", key, e)))?;

        Ok(Some(CachedResponse {
            status: meta.status,
            content_type: meta.content_type,
            body,
        }))
    }

    /// Keys of all entries, in directory order
    pub async fn keys(&self) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(META_EXTENSION) {
                continue;
            }
            match tokio::fs::read(&path).await {
                Ok(bytes) => match serde_json::from_slice::<EntryMeta>(&bytes) {
                    Ok(meta) => keys.push(meta.key),
                    Err(e) => warn!(path = %path.display(), error = %e, "Skipping corrupt entry"),
                },
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable entry"),
            }
        }
        Ok(keys)
    }

    /// Remove an entry; returns whether it existed
    pub async fn delete(&self, key: &str) -> StorageResult<bool> {
        let existed = match tokio::fs::remove_file(self.entry_path(key, META_EXTENSION)).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(StorageError::WriteFailed(e.to_string())),
        };
        let _ = tokio::fs::remove_file(self.entry_path(key, BODY_EXTENSION)).await;
        Ok(existed)
    }
}

/// Write to a temporary sibling, then rename into place
async fn write_atomic(path: &Path, data: &[u8]) -> StorageResult<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, data)
        .await
        .map_err(|e| StorageError::WriteFailed(format!("{}: {}", tmp.display(), e)))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| StorageError::WriteFailed(format!("{}: {}", path.display(), e)))
}

/// Lowercase hex of the key's UTF-8 bytes
fn encode_key(key: &str) -> String {
    key.bytes().map(|b| format!("{:02x}", b)).collect()
}
