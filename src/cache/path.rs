//! Cache entry path resolution

use crate::cache::key::CacheKey;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use uuid::Uuid;

/// Join a cache root and a key with exactly one separator between them
pub fn join(root: &Path, key: &str) -> PathBuf {
    let root = root.to_string_lossy();
    if root.is_empty() {
        return PathBuf::from(key);
    }

    let trimmed = root.trim_end_matches(['/', MAIN_SEPARATOR]);
    PathBuf::from(format!("{trimmed}{MAIN_SEPARATOR}{key}"))
}

/// Whether the path begins at the filesystem root
pub fn is_absolute(path: &Path) -> bool {
    path.has_root()
}

/// Resolve a relative path against `base`; absolute paths are returned as-is
pub fn anchor(path: &Path, base: &Path) -> PathBuf {
    if is_absolute(path) {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Path of the cache entry for `key`
pub fn entry_path(root: &Path, key: &CacheKey) -> PathBuf {
    join(root, key.as_str())
}

/// Unique sibling directory used while populating an entry
pub fn staging_path(root: &Path, key: &CacheKey) -> PathBuf {
    join(root, &format!(".{}.tmp-{}", key, Uuid::new_v4().simple()))
}

/// Advisory lock file guarding population of `key`
pub fn lock_path(root: &Path, key: &CacheKey) -> PathBuf {
    join(root, &format!(".{}.lock", key))
}
