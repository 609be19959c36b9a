//! Content-addressed artifact cache.
//!
//! Every service derives a [`CacheKey`] from the semantically relevant,
//! already-normalized request fields and consults the cache before invoking
//! its capability engine. Artifacts live on local disk, named by key and
//! format extension; once written, a file is treated as immutable and
//! authoritative for all future requests bearing the same key.
//!
//! Two deliberate properties carried over from the source system:
//!
//! - No expiry and no size cap. The store grows without bound; eviction
//!   would be an explicit, documented change.
//! - No concurrent-write guard. Two simultaneous misses for the same key
//!   race to write the same path; last writer wins, which is tolerable only
//!   because writes are idempotent per key. Writes go through a temp file +
//!   rename so readers never observe a partially written artifact.
//!
//! A failed store must propagate as a request failure: the response
//! references an artifact URL that would otherwise 404.
//!
//! Probed artifact metadata (duration, size) is memoised in a bounded
//! in-memory cache so repeated hits do not re-probe the file every time.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Separator inserted between key fields before hashing.
///
/// Keeps field boundaries unambiguous: `["ab", "c"]` and `["a", "bc"]`
/// hash differently.
const FIELD_SEPARATOR: u8 = 0x1f;

/// Deterministic fingerprint of a request's semantic fields.
///
/// SHA-256 over the ordered fields, rendered as 64 lowercase hex chars.
/// Stable across processes and hosts, so a shared cache volume keys
/// consistently.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Compute a key from the ordered semantic fields of a request.
    ///
    /// Callers normalize text fields first, so two requests differing only
    /// in incidental whitespace map to the same key.
    pub fn compute(fields: &[&str]) -> Self {
        let mut hasher = Sha256::new();
        for field in fields {
            hasher.update(field.as_bytes());
            hasher.update([FIELD_SEPARATOR]);
        }
        Self(format!("{:x}", hasher.finalize()))
    }

    /// The hex digest, used as the artifact file stem.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Byte size and media duration of a cached artifact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArtifactMeta {
    /// File size in bytes.
    pub size: u64,
    /// Media duration in seconds; 0.0 for non-media artifacts.
    pub duration: f64,
}

/// Default maximum number of memoised artifact metadata entries.
const DEFAULT_META_CACHE_MAX: u64 = 10_000;

/// On-disk, key-addressed artifact store for one service.
pub struct ArtifactCache {
    dir: PathBuf,
    meta: moka::sync::Cache<String, ArtifactMeta>,
}

impl ArtifactCache {
    /// Open (creating if necessary) a cache rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            meta: moka::sync::Cache::new(DEFAULT_META_CACHE_MAX),
        })
    }

    /// Root directory of this cache.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path an artifact with this key and extension would live at.
    pub fn path_for(&self, key: &CacheKey, ext: &str) -> PathBuf {
        self.dir.join(format!("{key}.{ext}"))
    }

    /// Look up a cached artifact.
    ///
    /// Returns the path iff a file named by `key` exists in the cache
    /// directory.
    pub fn lookup(&self, key: &CacheKey, ext: &str) -> Option<PathBuf> {
        let path = self.path_for(key, ext);
        path.exists().then_some(path)
    }

    /// Store artifact bytes under `{key}.{ext}`.
    ///
    /// Written via a sibling temp file then renamed into place, so a
    /// concurrent reader sees either the old artifact or the complete new
    /// one, never a torn write.
    pub async fn store_bytes(&self, key: &CacheKey, ext: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(key, ext);
        let tmp = self.dir.join(format!(".{key}.{ext}.tmp"));
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        self.meta.invalidate(&file_name_of(&path));
        Ok(path)
    }

    /// Move an already-produced file into the cache under `{key}.{ext}`.
    ///
    /// Falls back to copy + remove when `src` is on a different filesystem.
    pub async fn store_file(&self, key: &CacheKey, ext: &str, src: &Path) -> Result<PathBuf> {
        let path = self.path_for(key, ext);
        if tokio::fs::rename(src, &path).await.is_err() {
            tokio::fs::copy(src, &path).await?;
            let _ = tokio::fs::remove_file(src).await;
        }
        self.meta.invalidate(&file_name_of(&path));
        Ok(path)
    }

    /// Read a cached text artifact.
    pub async fn read_text(&self, key: &CacheKey, ext: &str) -> Result<String> {
        let path = self.path_for(key, ext);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|_| Error::NotFound(file_name_of(&path)))
    }

    /// Memoised artifact metadata lookup.
    ///
    /// On miss, `probe` is invoked to compute the metadata (typically an
    /// ffprobe call), and the result is retained.
    pub async fn meta_or_probe<F, Fut>(&self, path: &Path, probe: F) -> Result<ArtifactMeta>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<ArtifactMeta>>,
    {
        let name = file_name_of(path);
        if let Some(meta) = self.meta.get(&name) {
            return Ok(meta);
        }
        let meta = probe().await?;
        self.meta.insert(name, meta);
        Ok(meta)
    }

    /// Number of artifacts currently in the cache directory.
    ///
    /// Counts files only; used by the metrics endpoints.
    pub fn artifact_count(&self) -> usize {
        std::fs::read_dir(&self.dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| e.path().is_file())
                    .count()
            })
            .unwrap_or(0)
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
