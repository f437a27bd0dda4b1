//! Archive reader

use super::ArchiveError;
use filetime::FileTime;
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Component, Path, PathBuf};
use tar::{Archive, Entry, EntryType};
use tracing::{debug, trace, warn};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// A non-fatal problem met during extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractWarning {
    pub entry: PathBuf,
    pub reason: String,
}

/// Outcome of a successful [`extract`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Entries written to disk
    pub entries: usize,
    /// Entries skipped with a warning
    pub warnings: Vec<ExtractWarning>,
}

/// Unpack the archive at `archive` into `dest`.
///
/// gzip and plain tar input are detected from the stream's magic bytes.
/// Restores permission bits, modification times and extended attributes
/// (which carry ACL entries); ownership and filesystem flags are left alone.
///
/// Entries that would land outside `dest` and unsupported entry types are
/// skipped with a warning. Any other failure aborts immediately and leaves
/// whatever was already written in place.
pub fn extract(archive: &Path, dest: &Path) -> Result<ExtractSummary, ArchiveError> {
    let file = File::open(archive).map_err(|e| ArchiveError::OpenInput {
        path: archive.to_path_buf(),
        source: e,
    })?;
    let mut reader = BufReader::new(file);

    let gzipped = reader
        .fill_buf()
        .map_err(|e| ArchiveError::Read { source: e })?
        .starts_with(&GZIP_MAGIC);

    debug!(
        "Extracting {} into {} ({})",
        archive.display(),
        dest.display(),
        if gzipped { "gzip" } else { "plain tar" }
    );

    if gzipped {
        extract_from(GzDecoder::new(reader), dest)
    } else {
        extract_from(reader, dest)
    }
}

/// Unpack an uncompressed tar stream into `dest`
pub fn extract_from<R: Read>(input: R, dest: &Path) -> Result<ExtractSummary, ArchiveError> {
    fs::create_dir_all(dest).map_err(|e| ArchiveError::Extract {
        entry: dest.to_path_buf(),
        source: e,
    })?;

    let mut archive = Archive::new(input);
    archive.set_preserve_permissions(true);
    archive.set_preserve_mtime(true);
    archive.set_unpack_xattrs(true);
    archive.set_overwrite(true);

    let mut summary = ExtractSummary::default();
    // Directories are finished last, deepest first, so writing their
    // children does not disturb restored mtimes or read-only modes.
    let mut directories = Vec::new();

    for entry in archive
        .entries()
        .map_err(|e| ArchiveError::Read { source: e })?
    {
        let mut entry = entry.map_err(|e| ArchiveError::Read { source: e })?;
        let path = entry
            .path()
            .map_err(|e| ArchiveError::Read { source: e })?
            .into_owned();

        match entry.header().entry_type() {
            EntryType::Directory => {
                directories.push(entry);
                continue;
            }
            EntryType::Regular
            | EntryType::Continuous
            | EntryType::GNUSparse
            | EntryType::Symlink
            | EntryType::Link => {}
            EntryType::XGlobalHeader | EntryType::XHeader => continue,
            other => {
                summary
                    .warnings
                    .push(skip(&path, format!("unsupported entry type {:?}", other)));
                continue;
            }
        }

        trace!("unpack {}", path.display());
        match entry.unpack_in(dest) {
            Ok(true) => summary.entries += 1,
            Ok(false) => summary
                .warnings
                .push(skip(&path, "path escapes the destination".to_string())),
            Err(e) => return Err(ArchiveError::Extract { entry: path, source: e }),
        }
    }

    directories.sort_by(|a, b| b.path_bytes().cmp(&a.path_bytes()));
    for mut dir in directories {
        let path = dir
            .path()
            .map_err(|e| ArchiveError::Read { source: e })?
            .into_owned();
        match dir.unpack_in(dest) {
            Ok(true) => {
                // unpack_in leaves directory mtimes at the extraction time
                restore_mtime(&dir, &target_in(dest, &path)).map_err(|e| ArchiveError::Extract {
                    entry: path.clone(),
                    source: e,
                })?;
                summary.entries += 1;
            }
            Ok(false) => summary
                .warnings
                .push(skip(&path, "path escapes the destination".to_string())),
            Err(e) => return Err(ArchiveError::Extract { entry: path, source: e }),
        }
    }

    debug!(
        "Extracted {} entries ({} warnings)",
        summary.entries,
        summary.warnings.len()
    );
    Ok(summary)
}

/// Where `unpack_in` placed `path`: root and `.` components are dropped
fn target_in(dest: &Path, path: &Path) -> PathBuf {
    let mut target = dest.to_path_buf();
    for part in path.components() {
        if let Component::Normal(part) = part {
            target.push(part);
        }
    }
    target
}

fn restore_mtime<R: Read>(entry: &Entry<'_, R>, target: &Path) -> io::Result<()> {
    let mtime = entry.header().mtime()?;
    filetime::set_file_mtime(target, FileTime::from_unix_time(mtime as i64, 0))
}

fn skip(path: &Path, reason: String) -> ExtractWarning {
    warn!("Skipping {}: {}", path.display(), reason);
    ExtractWarning {
        entry: path.to_path_buf(),
        reason,
    }
}
