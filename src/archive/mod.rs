//! Archive codec for cache storage and transfer
//!
//! Packs a directory tree into a gzip-compressed tar stream and unpacks it
//! again. Only a narrow subset of tar is produced: regular files,
//! directories and symlinks with GNU (default) or ustar headers.
//!
//! # Preserved metadata
//!
//! | Attribute | Pack | Extract |
//! |-----------|------|---------|
//! | Permission bits | yes | yes |
//! | Modification time | yes | yes |
//! | Extended attributes / ACL entries | no | yes, when present in the stream |
//! | Owner uid/gid | recorded | not restored |
//! | Filesystem flags | no | no |

mod extract;
mod pack;

pub use extract::{extract, extract_from, ExtractSummary, ExtractWarning};
pub use pack::{collect_files, pack, PackSummary, CHUNK_SIZE};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised by the archive codec
#[derive(Error, Debug)]
pub enum ArchiveError {
    // Setup errors, raised before any entry is written
    #[error("Invalid compression level {level} (expected 0-9)")]
    Compression { level: u32 },

    #[error("Unsupported archive format: {0} (expected gnu or ustar)")]
    Format(String),

    #[error("Cannot open archive output {path}: {source}")]
    OpenOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Per-entry pack errors
    #[error("{path} is not beneath archive root {root}")]
    EntryOutsideRoot { path: PathBuf, root: PathBuf },

    #[error("Cannot stat {path}: {source}")]
    EntryStat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Read error in {path}, partial data left in archive: {source}")]
    EntryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive write failed at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Extraction errors
    #[error("Cannot open archive {path}: {source}")]
    OpenInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive read failed: {source}")]
    Read {
        #[source]
        source: std::io::Error,
    },

    #[error("Extraction failed at {entry}: {source}")]
    Extract {
        entry: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Tar header flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchiveFormat {
    /// GNU headers, unlimited path lengths
    #[default]
    Gnu,
    /// POSIX ustar headers, paths up to 255 bytes
    Ustar,
}

impl ArchiveFormat {
    pub(crate) fn header(&self) -> tar::Header {
        match self {
            Self::Gnu => tar::Header::new_gnu(),
            Self::Ustar => tar::Header::new_ustar(),
        }
    }
}

impl FromStr for ArchiveFormat {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gnu" => Ok(Self::Gnu),
            "ustar" => Ok(Self::Ustar),
            _ => Err(ArchiveError::Format(s.to_string())),
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gnu => write!(f, "gnu"),
            Self::Ustar => write!(f, "ustar"),
        }
    }
}

/// Options for writing an archive
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveOptions {
    /// gzip level, 0 (store) to 9 (best)
    pub compression_level: u32,

    /// Header format: "gnu" or "ustar"
    pub format: String,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            compression_level: 6,
            format: ArchiveFormat::Gnu.to_string(),
        }
    }
}

impl ArchiveOptions {
    /// Validate the compression level
    pub fn compression(&self) -> Result<flate2::Compression, ArchiveError> {
        if self.compression_level > 9 {
            return Err(ArchiveError::Compression {
                level: self.compression_level,
            });
        }
        Ok(flate2::Compression::new(self.compression_level))
    }

    /// Parse the header format
    pub fn archive_format(&self) -> Result<ArchiveFormat, ArchiveError> {
        self.format.parse()
    }
}
