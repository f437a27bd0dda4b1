//! Materialization of cache entries by copy or symlink
//!
//! Neither operation is atomic: a failure midway through `copy_tree`
//! leaves a partially copied tree behind.

use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::cache::path::anchor;

/// How a cache hit is materialized into the cache source path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Materialize {
    /// Recursive copy of the entry
    #[default]
    Copy,
    /// Single symbolic link to the entry
    Link,
}

/// Copy the contents of `from` into `to`, creating `to` if missing.
///
/// Existing files are overwritten and symlinks are recreated rather than
/// followed.
pub fn copy_tree(from: &Path, to: &Path) -> io::Result<()> {
    debug!("Copy data from {} to {}", from.display(), to.display());

    let root_meta = fs::metadata(from)?;
    if !root_meta.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a directory", from.display()),
        ));
    }
    fs::create_dir_all(to)?;

    // Directory modes are applied last so read-only directories can be filled.
    let mut dir_modes = Vec::new();

    for entry in WalkDir::new(from).min_depth(1).follow_links(false) {
        let entry = entry.map_err(io::Error::from)?;
        let rel = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let dest = to.join(rel);
        let file_type = entry.file_type();

        if file_type.is_symlink() {
            let target = fs::read_link(entry.path())?;
            remove_path(&dest)?;
            trace!("link {} -> {}", dest.display(), target.display());
            symlink(&target, &dest)?;
        } else if file_type.is_dir() {
            if fs::symlink_metadata(&dest).is_ok_and(|m| !m.is_dir()) {
                remove_path(&dest)?;
            }
            fs::create_dir_all(&dest)?;
            dir_modes.push((dest, entry.metadata().map_err(io::Error::from)?.permissions()));
        } else {
            if fs::symlink_metadata(&dest).is_ok_and(|m| !m.is_file()) {
                remove_path(&dest)?;
            }
            trace!("copy {}", rel.display());
            fs::copy(entry.path(), &dest)?;
        }
    }

    for (dir, perms) in dir_modes.into_iter().rev() {
        fs::set_permissions(&dir, perms)?;
    }

    Ok(())
}

/// Create a symlink at `to` pointing at `from`.
///
/// A relative `from` is resolved against `base` first, because a relative
/// link target is interpreted from the link's own directory.
pub fn link(from: &Path, to: &Path, base: &Path) -> io::Result<()> {
    let target = anchor(from, base);
    debug!("Create link from {} to {}", target.display(), to.display());
    symlink(&target, to)
}

/// Remove whatever is at `path`: a directory tree, a file, or a symlink
/// (never the symlink's target). Missing paths are not an error.
pub fn remove_path(path: &Path) -> io::Result<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        remove_link_or_file(path)
    }
}

#[cfg(unix)]
fn remove_link_or_file(path: &Path) -> io::Result<()> {
    fs::remove_file(path)
}

#[cfg(windows)]
fn remove_link_or_file(path: &Path) -> io::Result<()> {
    // Directory symlinks on Windows must be removed as directories.
    fs::remove_file(path).or_else(|_| fs::remove_dir(path))
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    let resolved = match link.parent() {
        Some(parent) => parent.join(target),
        None => target.to_path_buf(),
    };
    if resolved.is_dir() {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}
