//! Archive writer

use super::{ArchiveError, ArchiveFormat, ArchiveOptions};
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tar::{Builder, HeaderMode};
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

/// Read size used when streaming file data into the archive
pub const CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Counts of what was written by [`pack`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackSummary {
    pub files: usize,
    pub directories: usize,
    pub symlinks: usize,
    /// Sockets, fifos and devices are not archived
    pub skipped: usize,
    /// Uncompressed bytes of file data
    pub bytes: u64,
}

impl PackSummary {
    pub fn entries(&self) -> usize {
        self.files + self.directories + self.symlinks
    }
}

/// All paths beneath `root` (not `root` itself), sorted, symlinks not followed
pub fn collect_files(root: &Path) -> Result<Vec<PathBuf>, ArchiveError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| ArchiveError::EntryStat {
            path: e.path().unwrap_or(root).to_path_buf(),
            source: e.into(),
        })?;
        files.push(entry.into_path());
    }

    Ok(files)
}

/// Write `files` (paths beneath `root`) into a gzip-compressed tar at `output`.
///
/// Compression and format settings are validated, and the output opened,
/// before any entry is written. A read error partway through a file aborts
/// the pack, but the bytes already written for that entry stay in the stream.
pub fn pack(
    root: &Path,
    output: &Path,
    files: &[PathBuf],
    options: &ArchiveOptions,
) -> Result<PackSummary, ArchiveError> {
    let compression = options.compression()?;
    let format = options.archive_format()?;

    let out = File::create(output).map_err(|e| ArchiveError::OpenOutput {
        path: output.to_path_buf(),
        source: e,
    })?;

    debug!(
        "Packing {} entries from {} into {} ({}, level {})",
        files.len(),
        root.display(),
        output.display(),
        format,
        options.compression_level
    );

    let mut builder = Builder::new(GzEncoder::new(out, compression));
    builder.follow_symlinks(false);

    let mut summary = PackSummary::default();
    for path in files {
        append_entry(&mut builder, root, path, format, &mut summary)?;
    }

    let finish = |e: io::Error| ArchiveError::Write {
        path: output.to_path_buf(),
        source: e,
    };
    let encoder = builder.into_inner().map_err(finish)?;
    let mut file = encoder.finish().map_err(finish)?;
    file.flush().map_err(finish)?;

    debug!("Packed {} entries ({} bytes)", summary.entries(), summary.bytes);
    Ok(summary)
}

fn append_entry<W: Write>(
    builder: &mut Builder<W>,
    root: &Path,
    path: &Path,
    format: ArchiveFormat,
    summary: &mut PackSummary,
) -> Result<(), ArchiveError> {
    let rel = path
        .strip_prefix(root)
        .map_err(|_| ArchiveError::EntryOutsideRoot {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
        })?;
    if rel.as_os_str().is_empty() {
        return Ok(());
    }

    let meta = fs::symlink_metadata(path).map_err(|e| ArchiveError::EntryStat {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut header = format.header();
    header.set_metadata_in_mode(&meta, HeaderMode::Complete);

    let write_err = |e: io::Error| ArchiveError::Write {
        path: path.to_path_buf(),
        source: e,
    };

    let file_type = meta.file_type();
    if file_type.is_symlink() {
        let target = fs::read_link(path).map_err(|e| ArchiveError::EntryRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        trace!("symlink {} -> {}", rel.display(), target.display());
        builder
            .append_link(&mut header, rel, &target)
            .map_err(write_err)?;
        summary.symlinks += 1;
    } else if file_type.is_dir() {
        trace!("dir {}", rel.display());
        header.set_size(0);
        builder
            .append_data(&mut header, rel, io::empty())
            .map_err(write_err)?;
        summary.directories += 1;
    } else if file_type.is_file() {
        trace!("file {} ({} bytes)", rel.display(), meta.len());
        let file = File::open(path).map_err(|e| ArchiveError::EntryRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let read = append_file(builder, &mut header, rel, path, file, meta.len())?;
        summary.bytes += read;
        summary.files += 1;
    } else {
        warn!("Skipping {}: unsupported file type", path.display());
        summary.skipped += 1;
    }

    Ok(())
}

/// Stream `len` bytes of `source` as the data of one entry.
///
/// A read failure or a short read aborts with `EntryRead`; whatever was
/// already copied stays in the archive stream.
fn append_file<W: Write, R: Read>(
    builder: &mut Builder<W>,
    header: &mut tar::Header,
    rel: &Path,
    path: &Path,
    source: R,
    len: u64,
) -> Result<u64, ArchiveError> {
    let mut reader = ChunkReader::new(source, len);
    let appended = builder.append_data(header, rel, &mut reader);

    if let Some(e) = reader.error.take() {
        return Err(ArchiveError::EntryRead {
            path: path.to_path_buf(),
            source: e,
        });
    }
    appended.map_err(|e| ArchiveError::Write {
        path: path.to_path_buf(),
        source: e,
    })?;

    if reader.read < len {
        return Err(ArchiveError::EntryRead {
            path: path.to_path_buf(),
            source: io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("file shrank to {} of {} bytes", reader.read, len),
            ),
        });
    }

    Ok(reader.read)
}

/// Reads a file in `CHUNK_SIZE` chunks, capped at the size recorded in the
/// header, and remembers read failures so they can be told apart from write
/// failures.
struct ChunkReader<R> {
    inner: io::Take<BufReader<R>>,
    read: u64,
    error: Option<io::Error>,
}

impl<R: Read> ChunkReader<R> {
    fn new(source: R, len: u64) -> Self {
        Self {
            inner: BufReader::with_capacity(CHUNK_SIZE, source).take(len),
            read: 0,
            error: None,
        }
    }
}

impl<R: Read> Read for ChunkReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.read(buf) {
            Ok(n) => {
                self.read += n as u64;
                Ok(n)
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Err(e),
            Err(e) => {
                let forwarded = io::Error::new(e.kind(), e.to_string());
                self.error = Some(e);
                Err(forwarded)
            }
        }
    }
}
