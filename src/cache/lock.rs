//! Per-key advisory lock for cache population

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Exclusive file lock held while a cache entry is populated.
///
/// Released when dropped. Only populators take the lock; readers of a
/// finished entry never do.
#[derive(Debug)]
pub struct EntryLock {
    file: File,
    path: PathBuf,
}

impl EntryLock {
    /// Acquire the lock at `path`, creating the lock file if needed.
    ///
    /// Blocks until no other process holds it.
    pub fn acquire(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)?;

        debug!("Waiting for cache lock {}", path.display());
        FileExt::lock_exclusive(&file)?;
        debug!("Acquired cache lock {}", path.display());

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }
}

impl Drop for EntryLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        debug!("Released cache lock {}", self.path.display());
    }
}
