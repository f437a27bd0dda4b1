//! Cache key derivation from identity file contents
//!
//! The key is the SHA-256 digest of the identity file's bytes, hex encoded.
//! Same lockfile = same cache. Changing the digest algorithm invalidates every
//! existing cache entry, so it must stay stable across releases.

use crate::error::{CadirError, CadirResult};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Length of a cache key in hex characters
pub const KEY_LEN: usize = 64;

/// Content-addressed cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive a key from raw bytes
    pub fn digest(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(hex::encode(hasher.finalize()))
    }

    /// Read an identity file and derive its key
    pub fn from_identity_file(path: &Path) -> CadirResult<Self> {
        let contents = fs::read(path).map_err(|e| CadirError::IdentityFileUnreadable {
            path: path.to_path_buf(),
            source: e,
        })?;

        let key = Self::digest(&contents);
        debug!("Identity file {} hashed to {}", path.display(), key);
        Ok(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
